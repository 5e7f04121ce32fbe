use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget},
};

use crate::app::App;
use crate::scheduler::Clock;
use crate::session::{Rating, SessionResult};
use crate::stats::{played_ago, HistorySummary};
use crate::storage::Storage;

/// Pure presenter for one history row
pub fn present_row(result: &SessionResult, now_ms: u64) -> Row<'static> {
    let rating = result.rating();
    let color = match rating {
        Rating::Perfect => Color::Yellow,
        Rating::Excellent | Rating::Great | Rating::Good => Color::Green,
        Rating::Fair => Color::Cyan,
        Rating::PracticeMore => Color::Red,
    };
    Row::new(vec![
        Cell::from(result.date.clone()),
        Cell::from(result.time.clone()),
        Cell::from(result.mode.clone()),
        Cell::from(format!("{}/{}", result.score, result.total_questions)),
        Cell::from(format!("{}%", result.percentage)).style(Style::default().fg(color)),
        Cell::from(rating.to_string()).style(Style::default().fg(color)),
        Cell::from(format!("{}s", result.duration_seconds)),
        Cell::from(played_ago(result, now_ms)),
    ])
}

pub fn summary_line(summary: &HistorySummary) -> String {
    if summary.games_played == 0 {
        return "no games yet".to_string();
    }
    format!(
        "{} games   avg {:.0}%   best {}%   {} perfect   {}/{} correct",
        summary.games_played,
        summary.average_percentage,
        summary.best_percentage,
        summary.perfect_games,
        summary.total_correct,
        summary.total_questions
    )
}

pub fn render_history<S: Storage, C: Clock>(app: &App<S, C>, area: Rect, buf: &mut Buffer) {
    let history = app.controller.history();
    let now_ms = app.controller.now_ms();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // summary
            Constraint::Min(0),    // table
            Constraint::Length(1), // legend
        ])
        .split(area);

    let summary = HistorySummary::from_history(history);
    Paragraph::new(summary_line(&summary))
        .block(Block::default().borders(Borders::ALL).title("History"))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    let header = Row::new(vec![
        Cell::from("Date"),
        Cell::from("Time"),
        Cell::from("Mode"),
        Cell::from("Score"),
        Cell::from("%"),
        Cell::from("Rating"),
        Cell::from("Took"),
        Cell::from("Played"),
    ])
    .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let visible = chunks[1].height.saturating_sub(3) as usize;
    let rows: Vec<Row> = history
        .iter()
        .skip(app.history_scroll)
        .take(visible)
        .map(|r| present_row(r, now_ms))
        .collect();

    let widths = [
        Constraint::Length(10),
        Constraint::Length(8),
        Constraint::Length(7),
        Constraint::Length(6),
        Constraint::Length(5),
        Constraint::Length(13),
        Constraint::Length(6),
        Constraint::Min(10),
    ];
    let scroll_info = if history.len() > visible {
        format!(" ({}/{}) ", app.history_scroll + rows.len(), history.len())
    } else {
        String::new()
    };
    Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Recent games{scroll_info}")),
        )
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        "(up/down) scroll / (c)lear / (b)ack / (q)uit",
        Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::GameMode;

    #[test]
    fn summary_line_empty() {
        assert_eq!(summary_line(&HistorySummary::default()), "no games yet");
    }

    #[test]
    fn summary_line_formats_figures() {
        let history = vec![
            SessionResult::new(3, 3, GameMode::Classic, 0, 5_000),
            SessionResult::new(1, 2, GameMode::Timed, 0, 5_000),
        ];
        let line = summary_line(&HistorySummary::from_history(&history));

        assert_eq!(line, "2 games   avg 75%   best 100%   1 perfect   4/5 correct");
    }
}
