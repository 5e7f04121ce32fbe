use itertools::Itertools;
use std::time::Duration;
use time_humanize::{Accuracy, HumanTime, Tense};

use crate::session::SessionResult;
use crate::util::mean;

/// Aggregate figures over a history, newest first or not
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistorySummary {
    pub games_played: usize,
    pub average_percentage: f64,
    pub best_percentage: u32,
    pub total_correct: u32,
    pub total_questions: u32,
    pub perfect_games: usize,
    /// (mode id, games) sorted by mode id
    pub games_per_mode: Vec<(String, usize)>,
}

impl HistorySummary {
    pub fn from_history(history: &[SessionResult]) -> Self {
        if history.is_empty() {
            return Self::default();
        }
        let percentages = history
            .iter()
            .map(|r| f64::from(r.percentage))
            .collect::<Vec<f64>>();

        Self {
            games_played: history.len(),
            average_percentage: mean(&percentages).unwrap_or(0.0),
            best_percentage: history.iter().map(|r| r.percentage).max().unwrap_or(0),
            total_correct: history.iter().map(|r| r.score).sum(),
            total_questions: history.iter().map(|r| r.total_questions).sum(),
            perfect_games: history.iter().filter(|r| r.percentage == 100).count(),
            games_per_mode: history
                .iter()
                .map(|r| r.mode.clone())
                .counts()
                .into_iter()
                .sorted()
                .collect(),
        }
    }
}

/// "3 minutes ago" style age of a result relative to `now_ms`
pub fn played_ago(result: &SessionResult, now_ms: u64) -> String {
    let age = Duration::from_millis(now_ms.saturating_sub(result.id));
    if age < Duration::from_secs(60) {
        return "just now".to_string();
    }
    HumanTime::from(age).to_text_en(Accuracy::Rough, Tense::Past)
}
