use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pause between hiding answer feedback and showing the next question
pub const TRANSITION_DURATION_MS: u64 = 300;

/// Countdown modes lose one second per tick
pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// Refresh rate of the count-up clock in speed mode
pub const COUNT_UP_TICK: Duration = Duration::from_millis(100);

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameMode {
    #[default]
    Classic,
    Timed,
    Speed,
    Hard,
}

impl GameMode {
    pub const ALL: [GameMode; 4] = [
        GameMode::Classic,
        GameMode::Timed,
        GameMode::Speed,
        GameMode::Hard,
    ];

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.to_string().eq_ignore_ascii_case(id.trim()))
    }

    /// Cycles through modes in menu order
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn profile(self) -> ModeProfile {
        match self {
            GameMode::Classic => ModeProfile {
                time_limit_secs: None,
                counts_down: false,
                shows_timer: false,
                feedback_duration_ms: 1800,
                transition_duration_ms: TRANSITION_DURATION_MS,
            },
            GameMode::Timed => ModeProfile {
                time_limit_secs: Some(60),
                counts_down: true,
                shows_timer: true,
                feedback_duration_ms: 1000,
                transition_duration_ms: TRANSITION_DURATION_MS,
            },
            GameMode::Speed => ModeProfile {
                time_limit_secs: None,
                counts_down: false,
                shows_timer: true,
                feedback_duration_ms: 800,
                transition_duration_ms: TRANSITION_DURATION_MS,
            },
            GameMode::Hard => ModeProfile {
                time_limit_secs: Some(90),
                counts_down: true,
                shows_timer: true,
                feedback_duration_ms: 1200,
                transition_duration_ms: TRANSITION_DURATION_MS,
            },
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            GameMode::Classic => "no clock, take your time",
            GameMode::Timed => "60 seconds on the clock",
            GameMode::Speed => "the clock counts up, be quick",
            GameMode::Hard => "90 seconds on the clock",
        }
    }
}

/// Timing and feedback pacing for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeProfile {
    pub time_limit_secs: Option<u32>,
    pub counts_down: bool,
    pub shows_timer: bool,
    pub feedback_duration_ms: u64,
    pub transition_duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    None,
    Countdown(u32),
    CountUp,
}

impl ModeProfile {
    pub fn timer_kind(&self) -> TimerKind {
        match (self.time_limit_secs, self.counts_down, self.shows_timer) {
            (Some(limit), true, _) => TimerKind::Countdown(limit),
            (None, false, true) => TimerKind::CountUp,
            _ => TimerKind::None,
        }
    }

    pub fn feedback_duration(&self) -> Duration {
        Duration::from_millis(self.feedback_duration_ms)
    }

    pub fn transition_duration(&self) -> Duration {
        Duration::from_millis(self.transition_duration_ms)
    }
}

/// Unknown identifiers fall back to classic.
pub fn resolve(mode_id: &str) -> ModeProfile {
    GameMode::from_id(mode_id).unwrap_or_default().profile()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_table() {
        let classic = resolve("classic");
        assert_eq!(classic.time_limit_secs, None);
        assert!(!classic.shows_timer);
        assert_eq!(classic.feedback_duration_ms, 1800);

        let timed = resolve("timed");
        assert_eq!(timed.time_limit_secs, Some(60));
        assert!(timed.counts_down);
        assert!(timed.shows_timer);
        assert_eq!(timed.feedback_duration_ms, 1000);

        let speed = resolve("speed");
        assert_eq!(speed.time_limit_secs, None);
        assert!(!speed.counts_down);
        assert!(speed.shows_timer);
        assert_eq!(speed.feedback_duration_ms, 800);

        let hard = resolve("hard");
        assert_eq!(hard.time_limit_secs, Some(90));
        assert!(hard.counts_down);
        assert_eq!(hard.feedback_duration_ms, 1200);
    }

    #[test]
    fn test_unknown_mode_is_classic() {
        assert_eq!(resolve("zen"), GameMode::Classic.profile());
        assert_eq!(resolve(""), GameMode::Classic.profile());
    }

    #[test]
    fn test_descriptions_match_profiles() {
        for mode in GameMode::ALL {
            let text = mode.description();
            match mode.profile().time_limit_secs {
                Some(limit) => assert!(text.starts_with(&format!("{limit} seconds")), "{mode}: {text}"),
                None => assert!(!text.contains("seconds"), "{mode}: {text}"),
            }
        }
    }

    #[test]
    fn test_from_id_ignores_case() {
        assert_eq!(GameMode::from_id("Timed"), Some(GameMode::Timed));
        assert_eq!(GameMode::from_id(" HARD "), Some(GameMode::Hard));
        assert_eq!(GameMode::from_id("nope"), None);
    }

    #[test]
    fn test_display_is_lowercase_id() {
        assert_eq!(GameMode::Classic.to_string(), "classic");
        assert_eq!(GameMode::Speed.to_string(), "speed");
    }

    #[test]
    fn test_timer_kind() {
        assert_eq!(GameMode::Classic.profile().timer_kind(), TimerKind::None);
        assert_eq!(
            GameMode::Timed.profile().timer_kind(),
            TimerKind::Countdown(60)
        );
        assert_eq!(GameMode::Speed.profile().timer_kind(), TimerKind::CountUp);
        assert_eq!(
            GameMode::Hard.profile().timer_kind(),
            TimerKind::Countdown(90)
        );
    }

    #[test]
    fn test_next_cycles() {
        assert_eq!(GameMode::Classic.next(), GameMode::Timed);
        assert_eq!(GameMode::Hard.next(), GameMode::Classic);
    }

    #[test]
    fn test_serde_uses_ids() {
        assert_eq!(serde_json::to_string(&GameMode::Hard).unwrap(), "\"hard\"");
        let mode: GameMode = serde_json::from_str("\"speed\"").unwrap();
        assert_eq!(mode, GameMode::Speed);
    }
}
