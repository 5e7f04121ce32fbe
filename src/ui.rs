pub mod history;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;
use webbrowser::Browser;

use crate::app::{App, Screen};
use crate::question_bank::{ColorSwatch, Question};
use crate::scheduler::Clock;
use crate::session::{GameSession, SessionResult, SessionStatus};
use crate::storage::Storage;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

impl<S: Storage, C: Clock> Widget for &App<S, C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.screen {
            Screen::Home => render_home(self, area, buf),
            Screen::Game => match self.controller.session() {
                Some(session) => render_game(self, session, area, buf),
                None => render_home(self, area, buf),
            },
            Screen::Results => match self.finished_result() {
                Some(result) => render_results(self, result, area, buf),
                None => render_home(self, area, buf),
            },
            Screen::History => history::render_history(self, area, buf),
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn legend(text: &str) -> Paragraph<'_> {
    Paragraph::new(Span::styled(
        text,
        Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
    ))
    .alignment(Alignment::Center)
}

/// `left` and `right` pushed to opposite edges of `width`
pub fn spread(left: &str, right: &str, width: u16) -> String {
    let gap = (width as usize).saturating_sub(left.width() + right.width());
    format!("{left}{}{right}", " ".repeat(gap.max(1)))
}

fn swatch_color(swatch: &ColorSwatch) -> Color {
    swatch
        .rgb()
        .map(|(r, g, b)| Color::Rgb(r, g, b))
        .unwrap_or(Color::Gray)
}

fn render_home<S: Storage, C: Clock>(app: &App<S, C>, area: Rect, buf: &mut Buffer) {
    let mode = app.controller.settings().mode;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new(Span::styled(
        "chromatch",
        bold().fg(Color::Magenta),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    Paragraph::new(Line::from(vec![
        Span::styled(format!("{mode} mode"), bold()),
        Span::raw(format!("  {}", mode.description())),
    ]))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    if let Some(last) = app.controller.history().first() {
        Paragraph::new(Span::styled(
            format!(
                "last game: {}/{} ({}%) {}",
                last.score,
                last.total_questions,
                last.percentage,
                last.rating()
            ),
            Style::default().fg(Color::Cyan),
        ))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
    }

    legend("(enter) play / (m)ode / (h)istory / (q)uit").render(chunks[5], buf);
}

fn render_game<S: Storage, C: Clock>(
    app: &App<S, C>,
    session: &GameSession,
    area: Rect,
    buf: &mut Buffer,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // progress, score, timer
            Constraint::Length(1),
            Constraint::Min(5),    // swatch
            Constraint::Length(1),
            Constraint::Length(5), // options
            Constraint::Length(2), // feedback
            Constraint::Length(1), // legend
        ])
        .split(area);

    let left = format!(
        "question {}/{}",
        session.current_index() + 1,
        session.total_questions()
    );
    let right = match app.controller.timer_display() {
        Some(clock) => format!("score {}   {}", session.score(), clock),
        None => format!("score {}", session.score()),
    };
    Paragraph::new(Span::styled(spread(&left, &right, chunks[0].width), bold()))
        .render(chunks[0], buf);

    let question = session.current_question();
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(format!(" {} ", question.color.name), bold()))
        .title_alignment(Alignment::Center)
        .style(Style::default().bg(swatch_color(&question.color)))
        .render(chunks[2], buf);

    render_options(session, question, chunks[4], buf);

    if let Some(feedback) = app.last_feedback {
        let (text, color) = if feedback.is_correct {
            ("Correct!".to_string(), Color::Green)
        } else {
            let answer = feedback
                .correct_index
                .map(|i| question.options[i].label.as_str())
                .unwrap_or("?");
            (format!("Not quite, it was the {answer}"), Color::Red)
        };
        let mut style = bold().fg(color);
        if app.controller.is_transitioning() {
            style = style.add_modifier(Modifier::DIM);
        }
        Paragraph::new(Span::styled(text, style))
            .alignment(Alignment::Center)
            .render(chunks[5], buf);
    }

    legend("(1-3) answer / (enter) next / (f)inish / (esc) home").render(chunks[6], buf);
}

fn render_options(session: &GameSession, question: &Question, area: Rect, buf: &mut Buffer) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let revealed = session.status() != SessionStatus::Active;
    for (i, option) in question.options.iter().enumerate() {
        let border_style = match (revealed, option.is_correct, session.selected_option()) {
            (true, true, _) => Style::default().fg(Color::Green),
            (true, false, Some(sel)) if sel == i => Style::default().fg(Color::Red),
            (true, _, _) => Style::default().add_modifier(Modifier::DIM),
            (false, _, _) => Style::default(),
        };
        Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(option.label.clone(), bold())),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(format!(" {} ", i + 1)),
        )
        .render(columns[i], buf);
    }
}

fn render_results<S: Storage, C: Clock>(
    app: &App<S, C>,
    result: &SessionResult,
    area: Rect,
    buf: &mut Buffer,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let rating_color = match result.percentage {
        100 => Color::Yellow,
        p if p >= 70 => Color::Green,
        p if p >= 60 => Color::Cyan,
        _ => Color::Red,
    };
    Paragraph::new(Span::styled(result.rating().to_string(), bold().fg(rating_color)))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        format!(
            "{}/{} correct   {}%   {}s   {} mode",
            result.score,
            result.total_questions,
            result.percentage,
            result.duration_seconds,
            result.mode
        ),
        bold(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    if let Some(reason) = app.controller.session().and_then(GameSession::finish_reason) {
        Paragraph::new(Span::styled(
            reason.to_string(),
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
    }

    let recent = app.controller.recent_history();
    if recent.len() > 1 {
        Paragraph::new(recent_line(recent))
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray))
            .render(chunks[4], buf);
    }

    let text = if Browser::is_available() {
        "(r)etry / (h)istory / (t)weet / (esc) home / (q)uit"
    } else {
        "(r)etry / (h)istory / (esc) home / (q)uit"
    };
    legend(text).render(chunks[5], buf);
}

/// Percentages of recent games, newest first
pub fn recent_line(recent: &[SessionResult]) -> String {
    let scores = recent
        .iter()
        .map(|r| format!("{}%", r.percentage))
        .collect::<Vec<_>>();
    format!("recent: {}", scores.join("  "))
}
