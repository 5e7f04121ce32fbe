use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::error;

use crate::config::SettingsStore;
use crate::controller::{ControllerEvent, SessionController};
use crate::scheduler::Clock;
use crate::session::{AnswerFeedback, SessionResult, SessionStatus};
use crate::storage::Storage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Game,
    Results,
    History,
}

/// What the terminal loop should do after a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    Continue,
    Quit,
    OpenUrl(String),
}

pub struct App<S: Storage, C: Clock> {
    pub controller: SessionController<S, C>,
    pub screen: Screen,
    pub last_feedback: Option<AnswerFeedback>,
    pub history_scroll: usize,
    history_return: Screen,
    settings_store: Box<dyn SettingsStore>,
}

impl<S: Storage, C: Clock> App<S, C> {
    pub fn new(controller: SessionController<S, C>, settings_store: Box<dyn SettingsStore>) -> Self {
        Self {
            controller,
            screen: Screen::Home,
            last_feedback: None,
            history_scroll: 0,
            history_return: Screen::Home,
            settings_store,
        }
    }

    /// Skips the menu and goes straight into a game
    pub fn start_game(&mut self) {
        self.controller.start();
        self.last_feedback = None;
        self.screen = Screen::Game;
    }

    /// Drives timers. Returns true when something on screen changed.
    pub fn on_tick(&mut self) -> bool {
        let events = self.controller.poll();
        for event in &events {
            match event {
                ControllerEvent::QuestionAdvanced(_) => self.last_feedback = None,
                ControllerEvent::Finished(_) => self.screen = Screen::Results,
                ControllerEvent::TransitionStarted | ControllerEvent::TimerChanged(_) => {}
            }
        }
        !events.is_empty()
    }

    pub fn on_key(&mut self, key: KeyEvent) -> AppAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return AppAction::Quit;
        }
        match self.screen {
            Screen::Home => self.on_home_key(key),
            Screen::Game => self.on_game_key(key),
            Screen::Results => self.on_results_key(key),
            Screen::History => self.on_history_key(key),
        }
    }

    fn on_home_key(&mut self, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => self.start_game(),
            KeyCode::Char('m') => {
                let settings = self.controller.settings_mut();
                settings.mode = settings.mode.next();
                let mode = settings.mode;
                // only the mode changes on disk; one-run cli overrides stay unsaved
                let mut stored = self.settings_store.load();
                stored.mode = mode;
                if let Err(e) = self.settings_store.save(&stored) {
                    error!("unable to save settings: {e}");
                }
            }
            KeyCode::Char('h') => self.open_history(),
            KeyCode::Esc | KeyCode::Char('q') => return AppAction::Quit,
            _ => {}
        }
        AppAction::Continue
    }

    fn on_game_key(&mut self, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Char(c @ '1'..='3') => {
                let index = (c as u8 - b'1') as usize;
                if let Some(feedback) = self.controller.select_answer(index) {
                    self.last_feedback = Some(feedback);
                }
            }
            KeyCode::Enter => {
                if let Some(event) = self.controller.skip_feedback() {
                    match event {
                        ControllerEvent::Finished(_) => self.screen = Screen::Results,
                        _ => self.last_feedback = None,
                    }
                }
            }
            KeyCode::Char('f') => {
                if self.controller.finish().is_some() {
                    self.screen = Screen::Results;
                }
            }
            KeyCode::Esc => self.go_home(),
            _ => {}
        }
        AppAction::Continue
    }

    fn on_results_key(&mut self, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Char('r') => self.start_game(),
            KeyCode::Char('h') => self.open_history(),
            KeyCode::Char('t') => {
                if let Some(result) = self.finished_result() {
                    return AppAction::OpenUrl(share_url(result));
                }
            }
            KeyCode::Esc | KeyCode::Char('b') => self.go_home(),
            KeyCode::Char('q') => return AppAction::Quit,
            _ => {}
        }
        AppAction::Continue
    }

    fn on_history_key(&mut self, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Up => self.history_scroll = self.history_scroll.saturating_sub(1),
            KeyCode::Down => {
                let max = self.controller.history().len().saturating_sub(1);
                self.history_scroll = (self.history_scroll + 1).min(max);
            }
            KeyCode::Home => self.history_scroll = 0,
            KeyCode::Char('c') => {
                if let Err(e) = self.controller.clear_history() {
                    error!("unable to clear history: {e}");
                }
                self.history_scroll = 0;
            }
            KeyCode::Esc | KeyCode::Char('b') | KeyCode::Backspace => {
                self.screen = self.history_return;
            }
            KeyCode::Char('q') => return AppAction::Quit,
            _ => {}
        }
        AppAction::Continue
    }

    fn open_history(&mut self) {
        self.history_return = self.screen;
        self.history_scroll = 0;
        self.screen = Screen::History;
    }

    fn go_home(&mut self) {
        self.controller.go_home();
        self.last_feedback = None;
        self.screen = Screen::Home;
    }

    /// Result of the session on screen, once it has finished
    pub fn finished_result(&self) -> Option<&SessionResult> {
        let session = self.controller.session()?;
        if session.status() != SessionStatus::Finished {
            return None;
        }
        session.result()
    }
}

pub fn share_url(result: &SessionResult) -> String {
    format!(
        "https://twitter.com/intent/tweet?text=I%20matched%20{}%2F{}%20colors%20({}%25)%20in%20{}%20mode%20on%20chromatch",
        result.score, result.total_questions, result.percentage, result.mode
    )
}
