use chrono::{DateTime, Local, TimeZone};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mode::{GameMode, ModeProfile, TimerKind};
use crate::question_bank::Question;
use crate::util::percentage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SessionStatus {
    /// waiting for an answer
    Active,
    /// answer chosen, feedback visible, advance pending
    AnswerRevealed,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum FinishReason {
    #[strum(serialize = "all questions answered")]
    Completed,
    #[strum(serialize = "time expired")]
    TimeExpired,
    #[strum(serialize = "ended early")]
    EndedEarly,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("cannot {action} while session is {status}")]
    InvalidTransition {
        action: &'static str,
        status: SessionStatus,
    },
    #[error("option {index} out of range, question has {len} options")]
    OptionOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub selected: usize,
    pub correct_index: Option<usize>,
    pub is_correct: bool,
    pub is_last_question: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    NextQuestion(usize),
    Finished(SessionResult),
}

/// Record of one finished session, as persisted in history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResult {
    /// creation timestamp in epoch millis
    pub id: u64,
    pub score: u32,
    pub total_questions: u32,
    pub percentage: u32,
    pub date: String,
    pub time: String,
    pub mode: String,
    pub duration_seconds: u32,
}

impl SessionResult {
    pub fn new(
        score: u32,
        total_questions: u32,
        mode: GameMode,
        started_at_ms: u64,
        finished_at_ms: u64,
    ) -> Self {
        let finished_at = local_time(finished_at_ms);
        let elapsed_ms = finished_at_ms.saturating_sub(started_at_ms);
        Self {
            id: finished_at_ms,
            score,
            total_questions,
            percentage: percentage(score, total_questions),
            date: finished_at.format("%Y-%m-%d").to_string(),
            time: finished_at.format("%H:%M:%S").to_string(),
            mode: mode.to_string(),
            duration_seconds: ((elapsed_ms + 500) / 1000) as u32,
        }
    }

    pub fn rating(&self) -> Rating {
        Rating::from_percentage(self.percentage)
    }
}

fn local_time(epoch_ms: u64) -> DateTime<Local> {
    Local
        .timestamp_millis_opt(epoch_ms as i64)
        .single()
        .unwrap_or_else(Local::now)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Rating {
    Perfect,
    Excellent,
    Great,
    Good,
    Fair,
    #[strum(serialize = "Practice More")]
    PracticeMore,
}

impl Rating {
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            p if p >= 100 => Rating::Perfect,
            p if p >= 90 => Rating::Excellent,
            p if p >= 80 => Rating::Great,
            p if p >= 70 => Rating::Good,
            p if p >= 60 => Rating::Fair,
            _ => Rating::PracticeMore,
        }
    }
}

/// One playthrough. Owned by a single controller and discarded on restart.
#[derive(Debug, Clone)]
pub struct GameSession {
    questions: Vec<Question>,
    mode: GameMode,
    profile: ModeProfile,
    current_index: usize,
    score: u32,
    selected_option: Option<usize>,
    status: SessionStatus,
    /// seconds remaining for countdown modes, seconds elapsed otherwise
    timer_secs: u32,
    started_at_ms: u64,
    finish_reason: Option<FinishReason>,
    result: Option<SessionResult>,
}

impl GameSession {
    /// `questions` must not be empty; `QuestionBank` guarantees this for
    /// sessions built from it.
    pub fn new(questions: Vec<Question>, mode: GameMode, started_at_ms: u64) -> Self {
        debug_assert!(!questions.is_empty(), "a session needs at least one question");
        let profile = mode.profile();
        let timer_secs = match profile.timer_kind() {
            TimerKind::Countdown(limit) => limit,
            _ => 0,
        };
        info!(
            "starting {} session with {} questions",
            mode,
            questions.len()
        );
        Self {
            questions,
            mode,
            profile,
            current_index: 0,
            score: 0,
            selected_option: None,
            status: SessionStatus::Active,
            timer_secs,
            started_at_ms,
            finish_reason: None,
            result: None,
        }
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn profile(&self) -> &ModeProfile {
        &self.profile
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current_index]
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn selected_option(&self) -> Option<usize> {
        self.selected_option
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status == SessionStatus::Finished
    }

    pub fn timer_secs(&self) -> u32 {
        self.timer_secs
    }

    pub fn started_at_ms(&self) -> u64 {
        self.started_at_ms
    }

    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.finish_reason
    }

    /// Available once the session has finished
    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    pub fn select_answer(&mut self, option_index: usize) -> Result<AnswerFeedback, SessionError> {
        if self.status != SessionStatus::Active {
            return Err(SessionError::InvalidTransition {
                action: "select an answer",
                status: self.status,
            });
        }
        let question = &self.questions[self.current_index];
        let option = question
            .options
            .get(option_index)
            .ok_or(SessionError::OptionOutOfRange {
                index: option_index,
                len: question.options.len(),
            })?;

        let is_correct = option.is_correct;
        let correct_index = question.correct_index();
        // score is committed here so the result built at finish never
        // lags behind the last answer
        if is_correct {
            self.score += 1;
        }
        self.selected_option = Some(option_index);
        self.status = SessionStatus::AnswerRevealed;
        debug!(
            "question {} answered with option {} ({})",
            self.current_index,
            option_index,
            if is_correct { "correct" } else { "wrong" }
        );

        Ok(AnswerFeedback {
            selected: option_index,
            correct_index,
            is_correct,
            is_last_question: self.current_index + 1 == self.questions.len(),
        })
    }

    pub fn advance(&mut self, now_ms: u64) -> Result<Advance, SessionError> {
        if self.status != SessionStatus::AnswerRevealed {
            return Err(SessionError::InvalidTransition {
                action: "advance",
                status: self.status,
            });
        }
        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            self.selected_option = None;
            self.status = SessionStatus::Active;
            Ok(Advance::NextQuestion(self.current_index))
        } else {
            let result = self.complete(now_ms, FinishReason::Completed);
            Ok(Advance::Finished(result))
        }
    }

    /// One second of countdown. Returns the result when this tick expired
    /// the clock; expiry wins over whatever question is on screen.
    pub fn tick_countdown(&mut self, now_ms: u64) -> Option<SessionResult> {
        if self.is_finished() || !matches!(self.profile.timer_kind(), TimerKind::Countdown(_)) {
            return None;
        }
        self.timer_secs = self.timer_secs.saturating_sub(1);
        if self.timer_secs == 0 {
            Some(self.complete(now_ms, FinishReason::TimeExpired))
        } else {
            None
        }
    }

    /// Refreshes the count-up clock from wall time. Never finishes the session.
    pub fn update_elapsed(&mut self, now_ms: u64) {
        if self.is_finished() || self.profile.timer_kind() != TimerKind::CountUp {
            return;
        }
        self.timer_secs = (now_ms.saturating_sub(self.started_at_ms) / 1000) as u32;
    }

    /// Host-triggered finish from any live state
    pub fn finish(&mut self, now_ms: u64) -> Result<SessionResult, SessionError> {
        if self.is_finished() {
            return Err(SessionError::InvalidTransition {
                action: "finish",
                status: self.status,
            });
        }
        Ok(self.complete(now_ms, FinishReason::EndedEarly))
    }

    fn complete(&mut self, now_ms: u64, reason: FinishReason) -> SessionResult {
        self.status = SessionStatus::Finished;
        self.finish_reason = Some(reason);
        let result = SessionResult::new(
            self.score,
            self.questions.len() as u32,
            self.mode,
            self.started_at_ms,
            now_ms,
        );
        info!(
            "session finished ({}): {}/{} ({}%)",
            reason, result.score, result.total_questions, result.percentage
        );
        self.result = Some(result.clone());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question_bank::tests::sample_questions;
    use assert_matches::assert_matches;

    const T0: u64 = 1_700_000_000_000;

    fn session(n: usize, mode: GameMode) -> GameSession {
        GameSession::new(sample_questions(n), mode, T0)
    }

    fn answer(session: &mut GameSession, correct: bool) -> AnswerFeedback {
        let right = session.current_question().correct_index().unwrap();
        let pick = if correct { right } else { (right + 1) % 3 };
        session.select_answer(pick).unwrap()
    }

    fn assert_invariants(s: &GameSession) {
        if !s.is_finished() {
            assert!(s.current_index() < s.total_questions());
        }
        assert!(s.score() as usize <= s.current_index() + 1);
        assert_eq!(
            s.selected_option().is_none(),
            s.status() == SessionStatus::Active
        );
    }

    #[test]
    fn new_session_starts_active() {
        let s = session(5, GameMode::Classic);

        assert_eq!(s.status(), SessionStatus::Active);
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.score(), 0);
        assert_eq!(s.selected_option(), None);
        assert_eq!(s.timer_secs(), 0);
        assert!(s.result().is_none());
    }

    #[test]
    fn countdown_modes_start_at_limit() {
        assert_eq!(session(3, GameMode::Timed).timer_secs(), 60);
        assert_eq!(session(3, GameMode::Hard).timer_secs(), 90);
    }

    #[test]
    fn correct_answer_scores_and_reveals() {
        let mut s = session(3, GameMode::Classic);

        let fb = answer(&mut s, true);

        assert!(fb.is_correct);
        assert_eq!(fb.correct_index, Some(fb.selected));
        assert!(!fb.is_last_question);
        assert_eq!(s.score(), 1);
        assert_eq!(s.status(), SessionStatus::AnswerRevealed);
        assert_eq!(s.selected_option(), Some(fb.selected));
    }

    #[test]
    fn second_selection_is_rejected_without_side_effects() {
        let mut s = session(3, GameMode::Classic);
        let right = s.current_question().correct_index().unwrap();
        s.select_answer((right + 1) % 3).unwrap();

        let err = s.select_answer(right).unwrap_err();

        assert_eq!(
            err,
            SessionError::InvalidTransition {
                action: "select an answer",
                status: SessionStatus::AnswerRevealed
            }
        );
        assert_eq!(s.score(), 0);
        assert_eq!(s.selected_option(), Some((right + 1) % 3));
    }

    #[test]
    fn out_of_range_option_is_rejected() {
        let mut s = session(2, GameMode::Classic);

        assert_matches!(
            s.select_answer(3),
            Err(SessionError::OptionOutOfRange { index: 3, len: 3 })
        );
        assert_eq!(s.status(), SessionStatus::Active);
    }

    #[test]
    fn advance_requires_revealed_answer() {
        let mut s = session(2, GameMode::Classic);

        assert_matches!(
            s.advance(T0),
            Err(SessionError::InvalidTransition {
                status: SessionStatus::Active,
                ..
            })
        );
    }

    #[test]
    fn advance_moves_to_next_question() {
        let mut s = session(2, GameMode::Classic);
        answer(&mut s, true);

        assert_eq!(s.advance(T0 + 2000), Ok(Advance::NextQuestion(1)));
        assert_eq!(s.status(), SessionStatus::Active);
        assert_eq!(s.selected_option(), None);
    }

    #[test]
    fn final_score_counts_last_answer() {
        let mut s = session(5, GameMode::Classic);
        let pattern = [true, true, false, true, false];

        let mut last = None;
        for (i, correct) in pattern.into_iter().enumerate() {
            let fb = answer(&mut s, correct);
            assert_eq!(fb.is_last_question, i == 4);
            assert_invariants(&s);
            last = Some(s.advance(T0 + (i as u64 + 1) * 2000).unwrap());
            assert_invariants(&s);
        }

        let result = match last {
            Some(Advance::Finished(result)) => result,
            other => panic!("expected finish, got {other:?}"),
        };
        assert_eq!(result.score, 3);
        assert_eq!(result.total_questions, 5);
        assert_eq!(result.percentage, 60);
        assert_eq!(result.rating(), Rating::Fair);
        assert_eq!(result.duration_seconds, 10);
        assert_eq!(result.id, T0 + 10_000);
        assert_eq!(s.result(), Some(&result));
        assert_eq!(s.finish_reason(), Some(FinishReason::Completed));
    }

    #[test]
    fn correct_final_answer_is_not_lost() {
        let mut s = session(1, GameMode::Classic);
        answer(&mut s, true);

        match s.advance(T0 + 500).unwrap() {
            Advance::Finished(result) => {
                assert_eq!(result.score, 1);
                assert_eq!(result.percentage, 100);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn finished_session_rejects_everything() {
        let mut s = session(1, GameMode::Classic);
        answer(&mut s, false);
        s.advance(T0).unwrap();

        assert!(s.select_answer(0).is_err());
        assert!(s.advance(T0).is_err());
        assert!(s.finish(T0).is_err());
        assert_eq!(s.tick_countdown(T0), None);
    }

    #[test]
    fn countdown_expiry_forces_finish() {
        let mut s = session(10, GameMode::Timed);

        for sec in 1..60 {
            assert_eq!(s.tick_countdown(T0 + sec * 1000), None);
        }
        assert_eq!(s.timer_secs(), 1);

        let result = s.tick_countdown(T0 + 60_000).unwrap();

        assert!(s.is_finished());
        assert_eq!(s.finish_reason(), Some(FinishReason::TimeExpired));
        assert_eq!(result.score, 0);
        assert_eq!(result.total_questions, 10);
        assert_eq!(result.duration_seconds, 60);
    }

    #[test]
    fn countdown_expiry_during_feedback_keeps_score() {
        let mut s = session(4, GameMode::Timed);
        answer(&mut s, true);
        for _ in 0..59 {
            s.tick_countdown(T0);
        }

        let result = s.tick_countdown(T0 + 60_000).unwrap();

        assert_eq!(result.score, 1);
        assert_eq!(s.current_index(), 0);
    }

    #[test]
    fn countdown_ignored_in_untimed_modes() {
        let mut s = session(2, GameMode::Speed);

        assert_eq!(s.tick_countdown(T0 + 1000), None);
        assert_eq!(s.timer_secs(), 0);
        assert!(!s.is_finished());
    }

    #[test]
    fn count_up_tracks_wall_clock() {
        let mut s = session(2, GameMode::Speed);

        s.update_elapsed(T0 + 4_900);
        assert_eq!(s.timer_secs(), 4);

        s.update_elapsed(T0 + 3_600_000);
        assert_eq!(s.timer_secs(), 3600);
        assert!(!s.is_finished());
    }

    #[test]
    fn count_up_ignored_in_classic() {
        let mut s = session(2, GameMode::Classic);
        s.update_elapsed(T0 + 10_000);
        assert_eq!(s.timer_secs(), 0);
    }

    #[test]
    fn host_finish_ends_early() {
        let mut s = session(5, GameMode::Hard);
        answer(&mut s, true);

        let result = s.finish(T0 + 7_000).unwrap();

        assert_eq!(result.score, 1);
        assert_eq!(result.total_questions, 5);
        assert_eq!(result.percentage, 20);
        assert_eq!(result.mode, "hard");
        assert_eq!(s.finish_reason(), Some(FinishReason::EndedEarly));
    }

    #[test]
    fn rating_tiers() {
        assert_eq!(Rating::from_percentage(100), Rating::Perfect);
        assert_eq!(Rating::from_percentage(99), Rating::Excellent);
        assert_eq!(Rating::from_percentage(90), Rating::Excellent);
        assert_eq!(Rating::from_percentage(89), Rating::Great);
        assert_eq!(Rating::from_percentage(80), Rating::Great);
        assert_eq!(Rating::from_percentage(70), Rating::Good);
        assert_eq!(Rating::from_percentage(60), Rating::Fair);
        assert_eq!(Rating::from_percentage(59), Rating::PracticeMore);
        assert_eq!(Rating::from_percentage(0), Rating::PracticeMore);
        assert_eq!(Rating::PracticeMore.to_string(), "Practice More");
    }

    #[test]
    fn result_serializes_camel_case() {
        let result = SessionResult::new(2, 3, GameMode::Timed, T0, T0 + 1_400);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["totalQuestions"], 3);
        assert_eq!(json["percentage"], 67);
        assert_eq!(json["durationSeconds"], 1);
        assert_eq!(json["mode"], "timed");
        assert_eq!(json["id"], T0 + 1_400);
    }
}
