use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of "now" in epoch millis
pub trait Clock {
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }
}

/// Clock that only moves when told to. Used for headless runs and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by.as_millis() as u64);
    }

    pub fn set(&self, now_ms: u64) {
        self.now.set(now_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// A timer that came due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired<T> {
    pub handle: TimerHandle,
    /// when the timer was due, which may be earlier than the poll time
    pub due_ms: u64,
    pub task: T,
}

#[derive(Debug, Clone)]
struct Entry<T> {
    handle: TimerHandle,
    due_ms: u64,
    interval_ms: Option<u64>,
    task: T,
}

/// Cancelable one-shot and repeating timers over an external clock.
///
/// Nothing runs on its own: the owner polls with the current time and
/// dispatches whatever came due. Timers fire in due order, ties broken by
/// scheduling order, and a canceled handle never fires.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    next_id: u64,
    entries: Vec<Entry<T>>,
}

impl<T: Copy> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub fn schedule_after(&mut self, now_ms: u64, delay: Duration, task: T) -> TimerHandle {
        self.insert(now_ms + delay.as_millis() as u64, None, task)
    }

    /// First fire is one `interval` from `now_ms`
    pub fn schedule_every(&mut self, now_ms: u64, interval: Duration, task: T) -> TimerHandle {
        let interval_ms = (interval.as_millis() as u64).max(1);
        self.insert(now_ms + interval_ms, Some(interval_ms), task)
    }

    fn insert(&mut self, due_ms: u64, interval_ms: Option<u64>, task: T) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            handle,
            due_ms,
            interval_ms,
            task,
        });
        handle
    }

    /// Returns false if the handle already fired (one-shot) or was canceled
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle != handle);
        self.entries.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Takes the earliest timer due at or before `now_ms`. Repeating timers
    /// are rescheduled one interval after their due time, so a caller that
    /// fell behind gets every missed tick.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<Fired<T>> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due_ms <= now_ms)
            .min_by_key(|(_, e)| (e.due_ms, e.handle))
            .map(|(i, _)| i)?;

        let entry = &self.entries[idx];
        let fired = Fired {
            handle: entry.handle,
            due_ms: entry.due_ms,
            task: entry.task,
        };
        let interval_ms = entry.interval_ms;
        match interval_ms {
            Some(interval) => self.entries[idx].due_ms += interval,
            None => {
                self.entries.swap_remove(idx);
            }
        }
        Some(fired)
    }

    /// Drains everything due at or before `now_ms`
    pub fn drain_due(&mut self, now_ms: u64) -> Vec<Fired<T>> {
        std::iter::from_fn(|| self.pop_due(now_ms)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Task {
        A,
        B,
        Tick,
    }

    fn tasks(fired: &[Fired<Task>]) -> Vec<Task> {
        fired.iter().map(|f| f.task).collect()
    }

    #[test]
    fn one_shot_fires_once_when_due() {
        let mut s = Scheduler::new();
        let h = s.schedule_after(0, Duration::from_millis(100), Task::A);

        assert!(s.pop_due(99).is_none());
        let fired = s.pop_due(100).unwrap();
        assert_eq!(fired.handle, h);
        assert_eq!(fired.due_ms, 100);
        assert!(s.pop_due(1_000).is_none());
        assert!(!s.is_pending(h));
    }

    #[test]
    fn fires_in_due_order() {
        let mut s = Scheduler::new();
        s.schedule_after(0, Duration::from_millis(300), Task::B);
        s.schedule_after(0, Duration::from_millis(100), Task::A);

        assert_eq!(tasks(&s.drain_due(500)), vec![Task::A, Task::B]);
    }

    #[test]
    fn ties_fire_in_scheduling_order() {
        let mut s = Scheduler::new();
        s.schedule_after(0, Duration::from_millis(100), Task::B);
        s.schedule_after(0, Duration::from_millis(100), Task::A);

        assert_eq!(tasks(&s.drain_due(100)), vec![Task::B, Task::A]);
    }

    #[test]
    fn repeating_timer_catches_up() {
        let mut s = Scheduler::new();
        s.schedule_every(0, Duration::from_secs(1), Task::Tick);

        let fired = s.drain_due(3_500);

        assert_eq!(fired.len(), 3);
        assert_eq!(
            fired.iter().map(|f| f.due_ms).collect::<Vec<_>>(),
            vec![1_000, 2_000, 3_000]
        );
        assert_eq!(s.pending(), 1);
    }

    #[test]
    fn interleaves_one_shots_with_ticks() {
        let mut s = Scheduler::new();
        s.schedule_every(0, Duration::from_secs(1), Task::Tick);
        s.schedule_after(0, Duration::from_millis(1_500), Task::A);

        assert_eq!(
            tasks(&s.drain_due(2_000)),
            vec![Task::Tick, Task::A, Task::Tick]
        );
    }

    #[test]
    fn canceled_timer_never_fires() {
        let mut s = Scheduler::new();
        let a = s.schedule_after(0, Duration::from_millis(10), Task::A);
        let tick = s.schedule_every(0, Duration::from_millis(10), Task::Tick);

        assert!(s.cancel(a));
        assert!(s.cancel(tick));
        assert!(!s.cancel(a));
        assert!(s.drain_due(10_000).is_empty());
    }

    #[test]
    fn cancel_all_clears_everything() {
        let mut s = Scheduler::new();
        s.schedule_after(0, Duration::from_millis(10), Task::A);
        s.schedule_every(0, Duration::from_millis(10), Task::Tick);

        s.cancel_all();

        assert_eq!(s.pending(), 0);
        assert!(s.pop_due(u64::MAX).is_none());
    }

    #[test]
    fn cancel_between_pops_takes_effect() {
        let mut s = Scheduler::new();
        s.schedule_after(0, Duration::from_millis(10), Task::A);
        let b = s.schedule_after(0, Duration::from_millis(20), Task::B);

        assert_eq!(s.pop_due(100).map(|f| f.task), Some(Task::A));
        s.cancel(b);
        assert!(s.pop_due(100).is_none());
    }

    #[test]
    fn manual_clock_moves_on_request() {
        let clock = Rc::new(ManualClock::new(1_000));
        let shared = Rc::clone(&clock);

        clock.advance(Duration::from_millis(250));
        assert_eq!(shared.now_ms(), 1_250);

        clock.set(5);
        assert_eq!(shared.now_ms(), 5);
    }

    #[test]
    fn system_clock_is_after_epoch() {
        assert!(SystemClock.now_ms() > 1_600_000_000_000);
    }
}
