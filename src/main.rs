use chromatch::{
    app::{App, AppAction},
    config::{Settings, SettingsStore, StorageSettingsStore},
    controller::SessionController,
    export::{export_file_name, write_history_csv, ExportDocument},
    history::HistoryStore,
    mode::GameMode,
    question_bank::QuestionBank,
    runtime::{AppEvent, CrosstermEventSource, Runner, TICK_RATE_MS},
    scheduler::{Clock, SystemClock},
    stats::{played_ago, HistorySummary},
    storage::{FileStorage, Storage},
    ui::history::summary_line,
};
use chrono::Utc;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::{info, warn};
use rand::{rngs::StdRng, SeedableRng};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin},
    path::PathBuf,
    rc::Rc,
    time::Duration,
};
use webbrowser::Browser;

/// match the color to the object, against the clock or at your own pace
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal color-matching quiz: you are shown a color and pick which of three objects has it. Play relaxed, against a countdown or against the stopwatch, and keep a local history of your games."
)]
pub struct Cli {
    /// game mode to play
    #[clap(short = 'm', long, value_enum)]
    mode: Option<GameMode>,

    /// number of questions per game (default: every question in the bank)
    #[clap(short = 'n', long)]
    questions: Option<usize>,

    /// seed the shuffle for a reproducible question order
    #[clap(long)]
    seed: Option<u64>,

    /// directory holding history and settings
    #[clap(long)]
    data_dir: Option<PathBuf>,

    /// print past games and exit
    #[clap(long)]
    history: bool,

    /// delete all past games and exit
    #[clap(long)]
    clear_history: bool,

    /// write history and settings as json to this path (or into this
    /// directory) and exit
    #[clap(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// write history as csv to this path and exit
    #[clap(long, value_name = "PATH")]
    export_csv: Option<PathBuf>,

    /// remember --mode and --questions for future runs
    #[clap(long)]
    save_settings: bool,

    /// start playing right away instead of showing the menu
    #[clap(long)]
    play: bool,
}

impl Cli {
    fn apply_to(&self, settings: &mut Settings) {
        if let Some(mode) = self.mode {
            settings.mode = mode;
        }
        if let Some(n) = self.questions {
            settings.question_count = Some(n);
        }
    }

    fn is_one_shot(&self) -> bool {
        self.history || self.clear_history || self.export.is_some() || self.export_csv.is_some()
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    if std::env::var_os("RUST_LOG").is_some() {
        pretty_env_logger::init();
    }

    let cli = Cli::parse();

    let storage = Rc::new(match &cli.data_dir {
        Some(dir) => FileStorage::with_dir(dir),
        None => FileStorage::new(),
    });
    let settings_store = StorageSettingsStore::new(Rc::clone(&storage));
    let mut settings = settings_store.load();
    cli.apply_to(&mut settings);
    if cli.save_settings {
        settings_store.save(&settings)?;
        info!("settings saved to {}", storage.dir().display());
    }

    if cli.is_one_shot() {
        return run_one_shot(&cli, &storage, &settings);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let bank = QuestionBank::builtin()?;
    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let controller = SessionController::new(bank, settings, Rc::clone(&storage), SystemClock, rng);
    let mut app = App::new(controller, Box::new(settings_store));
    if cli.play {
        app.start_game();
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    outcome
}

fn run_one_shot<S: Storage>(cli: &Cli, storage: &S, settings: &Settings) -> Result<(), Box<dyn Error>> {
    let store = HistoryStore::new(storage, settings.history_capacity);

    if let Some(path) = &cli.export {
        let now = Utc::now();
        let path = if path.is_dir() {
            path.join(export_file_name(now))
        } else {
            path.clone()
        };
        let doc = ExportDocument::new(store.load(), settings.clone(), now);
        doc.write_to(&path)?;
        println!("exported {} games to {}", doc.history.len(), path.display());
    }
    if let Some(path) = &cli.export_csv {
        let history = store.load();
        write_history_csv(File::create(path)?, &history)?;
        println!("exported {} games to {}", history.len(), path.display());
    }
    if cli.history {
        print_history(&store.load());
    }
    if cli.clear_history {
        store.clear()?;
        println!("history cleared");
    }
    Ok(())
}

fn print_history(history: &[chromatch::SessionResult]) {
    let summary = HistorySummary::from_history(history);
    println!("{}", summary_line(&summary));
    if !summary.games_per_mode.is_empty() {
        let per_mode = summary
            .games_per_mode
            .iter()
            .map(|(mode, games)| format!("{mode} {games}"))
            .collect::<Vec<_>>();
        println!("{}", per_mode.join("   "));
    }
    let now = SystemClock.now_ms();
    for r in history {
        println!(
            "{} {}  {:<7} {:>3}/{:<3} {:>3}%  {:<13} {}",
            r.date,
            r.time,
            r.mode,
            r.score,
            r.total_questions,
            r.percentage,
            r.rating(),
            played_ago(r, now)
        );
    }
}

fn start_tui<B: Backend, S: Storage, C: Clock>(
    terminal: &mut Terminal<B>,
    app: &mut App<S, C>,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(TICK_RATE_MS),
    );

    terminal.draw(|f| f.render_widget(&*app, f.area()))?;
    loop {
        match runner.step() {
            AppEvent::Tick => {
                if app.on_tick() {
                    terminal.draw(|f| f.render_widget(&*app, f.area()))?;
                }
            }
            AppEvent::Resize => {
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
            AppEvent::Key(key) => {
                match app.on_key(key) {
                    AppAction::Quit => break,
                    AppAction::OpenUrl(url) => {
                        if Browser::is_available() {
                            if let Err(e) = webbrowser::open(&url) {
                                warn!("unable to open browser: {e}");
                            }
                        }
                    }
                    AppAction::Continue => {}
                }
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
        }
    }

    Ok(())
}
