use log::{debug, error, info};
use rand::rngs::StdRng;

use crate::config::Settings;
use crate::history::{HistoryStore, RECENT_HISTORY_CAPACITY};
use crate::mode::{ModeProfile, TimerKind, COUNTDOWN_TICK, COUNT_UP_TICK};
use crate::question_bank::QuestionBank;
use crate::scheduler::{Clock, Fired, Scheduler, TimerHandle};
use crate::session::{Advance, AnswerFeedback, GameSession, SessionResult, SessionStatus};
use crate::storage::{Storage, StorageError};
use crate::util::format_clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTask {
    FeedbackElapsed,
    TransitionElapsed,
    CountdownTick,
    CountUpTick,
}

/// A timer tagged with the session that scheduled it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTask {
    pub generation: u64,
    pub task: TimerTask,
}

/// What changed during a `poll`, for the host to redraw or react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    TransitionStarted,
    QuestionAdvanced(usize),
    TimerChanged(u32),
    Finished(SessionResult),
}

/// Glue between the host UI and one game at a time: owns the session, its
/// timers and the history it records into.
pub struct SessionController<S: Storage, C: Clock> {
    bank: QuestionBank,
    settings: Settings,
    session: Option<GameSession>,
    generation: u64,
    scheduler: Scheduler<ScheduledTask>,
    pending_advance: Option<TimerHandle>,
    transitioning: bool,
    history: HistoryStore<S>,
    recent: Vec<SessionResult>,
    clock: C,
    rng: StdRng,
}

impl<S: Storage, C: Clock> SessionController<S, C> {
    /// History is read once here; afterwards the in-memory copy follows
    /// each append.
    pub fn new(bank: QuestionBank, settings: Settings, storage: S, clock: C, rng: StdRng) -> Self {
        let history = HistoryStore::new(storage, settings.history_capacity);
        let recent = history.load();
        Self {
            bank,
            settings,
            session: None,
            generation: 0,
            scheduler: Scheduler::new(),
            pending_advance: None,
            transitioning: false,
            history,
            recent,
            clock,
            rng,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    pub fn status(&self) -> Option<SessionStatus> {
        self.session.as_ref().map(GameSession::status)
    }

    pub fn profile(&self) -> Option<&ModeProfile> {
        self.session.as_ref().map(GameSession::profile)
    }

    /// True between the end of answer feedback and the next question
    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    pub fn history(&self) -> &[SessionResult] {
        &self.recent
    }

    /// Newest games for the results screen, at most `RECENT_HISTORY_CAPACITY`
    pub fn recent_history(&self) -> &[SessionResult] {
        &self.recent[..self.recent.len().min(RECENT_HISTORY_CAPACITY)]
    }

    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Timer text for modes that show one
    pub fn timer_display(&self) -> Option<String> {
        let session = self.session.as_ref()?;
        if !session.profile().shows_timer {
            return None;
        }
        Some(format_clock(session.timer_secs()))
    }

    /// Begins a fresh session, dropping whatever was running
    pub fn start(&mut self) -> &GameSession {
        self.discard_session();
        let now = self.clock.now_ms();

        let mut questions = self.bank.shuffle(&mut self.rng);
        questions.truncate(self.settings.questions_for(self.bank.len()));
        let session = GameSession::new(questions, self.settings.mode, now);

        match session.profile().timer_kind() {
            TimerKind::Countdown(_) => {
                self.schedule_every(now, TimerTask::CountdownTick);
            }
            TimerKind::CountUp => {
                self.schedule_every(now, TimerTask::CountUpTick);
            }
            TimerKind::None => {}
        }
        self.session.insert(session)
    }

    pub fn restart(&mut self) -> &GameSession {
        self.start()
    }

    /// Leaves the game; nothing scheduled for it will run
    pub fn go_home(&mut self) {
        self.discard_session();
    }

    fn discard_session(&mut self) {
        self.scheduler.cancel_all();
        self.pending_advance = None;
        self.transitioning = false;
        self.generation += 1;
        self.session = None;
    }

    pub fn select_answer(&mut self, option_index: usize) -> Option<AnswerFeedback> {
        let session = self.session.as_mut()?;
        match session.select_answer(option_index) {
            Ok(feedback) => {
                let now = self.clock.now_ms();
                let delay = session.profile().feedback_duration();
                let task = self.task(TimerTask::FeedbackElapsed);
                self.pending_advance = Some(self.scheduler.schedule_after(now, delay, task));
                Some(feedback)
            }
            Err(e) => {
                debug!("ignoring selection: {e}");
                None
            }
        }
    }

    /// Cuts the feedback pause short and moves on right away
    pub fn skip_feedback(&mut self) -> Option<ControllerEvent> {
        if self.status() != Some(SessionStatus::AnswerRevealed) {
            return None;
        }
        if let Some(handle) = self.pending_advance.take() {
            self.scheduler.cancel(handle);
        }
        self.transitioning = false;
        let now = self.clock.now_ms();
        self.advance(now)
    }

    /// Ends the running game early and records it
    pub fn finish(&mut self) -> Option<SessionResult> {
        let now = self.clock.now_ms();
        let session = self.session.as_mut()?;
        match session.finish(now) {
            Ok(result) => {
                self.on_finished(&result);
                Some(result)
            }
            Err(e) => {
                debug!("ignoring finish: {e}");
                None
            }
        }
    }

    /// Runs every timer that came due since the last poll
    pub fn poll(&mut self) -> Vec<ControllerEvent> {
        let now = self.clock.now_ms();
        let mut events = Vec::new();
        while let Some(fired) = self.scheduler.pop_due(now) {
            if fired.task.generation != self.generation {
                debug!("dropping stale {:?}", fired.task.task);
                continue;
            }
            if let Some(event) = self.dispatch(fired, now) {
                events.push(event);
            }
        }
        events
    }

    fn dispatch(&mut self, fired: Fired<ScheduledTask>, now: u64) -> Option<ControllerEvent> {
        match fired.task.task {
            TimerTask::FeedbackElapsed => {
                let delay = self.session.as_ref()?.profile().transition_duration();
                self.transitioning = true;
                let task = self.task(TimerTask::TransitionElapsed);
                // chained off the due time so late polls don't stretch the pause
                self.pending_advance = Some(self.scheduler.schedule_after(fired.due_ms, delay, task));
                Some(ControllerEvent::TransitionStarted)
            }
            TimerTask::TransitionElapsed => {
                self.pending_advance = None;
                self.transitioning = false;
                self.advance(fired.due_ms)
            }
            TimerTask::CountdownTick => {
                let session = self.session.as_mut()?;
                match session.tick_countdown(fired.due_ms) {
                    Some(result) => {
                        self.on_finished(&result);
                        Some(ControllerEvent::Finished(result))
                    }
                    None => Some(ControllerEvent::TimerChanged(session.timer_secs())),
                }
            }
            TimerTask::CountUpTick => {
                let session = self.session.as_mut()?;
                let before = session.timer_secs();
                session.update_elapsed(now);
                let after = session.timer_secs();
                (after != before).then_some(ControllerEvent::TimerChanged(after))
            }
        }
    }

    fn advance(&mut self, at_ms: u64) -> Option<ControllerEvent> {
        let session = self.session.as_mut()?;
        match session.advance(at_ms) {
            Ok(Advance::NextQuestion(index)) => Some(ControllerEvent::QuestionAdvanced(index)),
            Ok(Advance::Finished(result)) => {
                self.on_finished(&result);
                Some(ControllerEvent::Finished(result))
            }
            Err(e) => {
                debug!("ignoring advance: {e}");
                None
            }
        }
    }

    fn on_finished(&mut self, result: &SessionResult) {
        self.scheduler.cancel_all();
        self.pending_advance = None;
        self.transitioning = false;
        match self.history.append(result.clone()) {
            Ok(history) => self.recent = history,
            Err(e) => {
                error!("unable to save session result: {e}");
                self.recent.insert(0, result.clone());
                self.recent.truncate(self.history.capacity());
            }
        }
        info!(
            "recorded {}/{} in {} mode",
            result.score, result.total_questions, result.mode
        );
    }

    pub fn clear_history(&mut self) -> Result<(), StorageError> {
        self.recent = self.history.clear()?;
        Ok(())
    }

    fn task(&self, task: TimerTask) -> ScheduledTask {
        ScheduledTask {
            generation: self.generation,
            task,
        }
    }

    fn schedule_every(&mut self, now: u64, task: TimerTask) -> TimerHandle {
        let interval = match task {
            TimerTask::CountUpTick => COUNT_UP_TICK,
            _ => COUNTDOWN_TICK,
        };
        let task = self.task(task);
        self.scheduler.schedule_every(now, interval, task)
    }
}
