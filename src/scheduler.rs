use std::cell::Cell;
use std::time::{Duration, Instant};

/// Every timer a game session can own. A session holds at most one of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum TaskKind {
    /// One-second aiming countdown tick
    Countdown,
    /// Replaces a broken target after the hit animation
    TargetRespawn,
    /// Swallows the start click before the stimulus delay is drawn
    StartDebounce,
    /// Turns the reaction screen blue
    Stimulus,
    /// Attaches the early/correct click listener while waiting
    ListenerArm,
    /// Restarts the waiting phase after an early click
    EarlyRecovery,
}

/// Monotonic time source, measured from an arbitrary origin
pub trait Clock {
    fn now(&self) -> Duration;
}

#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-advanced clock for tests and headless drivers
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, at: Duration) {
        self.now.set(at);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn now(&self) -> Duration {
        (**self).now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingTask {
    kind: TaskKind,
    due: Duration,
    seq: u64,
}

/// Named, cancelable one-shot tasks. Scheduling a kind that is already
/// pending replaces it.
#[derive(Debug, Default)]
pub struct Scheduler {
    pending: Vec<PendingTask>,
    seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, kind: TaskKind, now: Duration, after: Duration) {
        self.cancel(kind);
        self.seq += 1;
        self.pending.push(PendingTask {
            kind,
            due: now + after,
            seq: self.seq,
        });
    }

    pub fn cancel(&mut self, kind: TaskKind) {
        self.pending.retain(|task| task.kind != kind);
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, kind: TaskKind) -> bool {
        self.pending.iter().any(|task| task.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Removes and returns every task due at `now` with its due time,
    /// earliest first
    pub fn take_due(&mut self, now: Duration) -> Vec<(TaskKind, Duration)> {
        let mut due: Vec<PendingTask> = Vec::new();
        self.pending.retain(|task| {
            if task.due <= now {
                due.push(*task);
                false
            } else {
                true
            }
        });
        due.sort_by_key(|task| (task.due, task.seq));
        due.into_iter().map(|task| (task.kind, task.due)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn due_tasks_come_out_in_order() {
        let mut sched = Scheduler::new();
        sched.schedule(TaskKind::Stimulus, ms(0), ms(500));
        sched.schedule(TaskKind::ListenerArm, ms(0), ms(100));
        sched.schedule(TaskKind::EarlyRecovery, ms(0), ms(900));

        assert!(sched.take_due(ms(50)).is_empty());
        assert_eq!(
            sched.take_due(ms(600)),
            vec![(TaskKind::ListenerArm, ms(100)), (TaskKind::Stimulus, ms(500))]
        );
        assert!(sched.is_pending(TaskKind::EarlyRecovery));
        assert_eq!(
            sched.take_due(ms(900)),
            vec![(TaskKind::EarlyRecovery, ms(900))]
        );
        assert!(sched.is_empty());
    }

    #[test]
    fn rescheduling_replaces_previous_task() {
        let mut sched = Scheduler::new();
        sched.schedule(TaskKind::Countdown, ms(0), ms(1000));
        sched.schedule(TaskKind::Countdown, ms(500), ms(1000));
        assert!(sched.take_due(ms(1000)).is_empty());
        assert_eq!(sched.take_due(ms(1500)), vec![(TaskKind::Countdown, ms(1500))]);
    }

    #[test]
    fn cancelled_tasks_never_fire() {
        let mut sched = Scheduler::new();
        sched.schedule(TaskKind::Stimulus, ms(0), ms(10));
        sched.schedule(TaskKind::TargetRespawn, ms(0), ms(10));
        sched.cancel(TaskKind::Stimulus);
        assert_eq!(sched.take_due(ms(20)), vec![(TaskKind::TargetRespawn, ms(10))]);

        sched.schedule(TaskKind::Countdown, ms(20), ms(10));
        sched.cancel_all();
        assert!(sched.take_due(ms(100)).is_empty());
    }

    #[test]
    fn late_take_reports_original_due_time() {
        let mut sched = Scheduler::new();
        sched.schedule(TaskKind::Countdown, ms(0), ms(1000));
        assert_eq!(sched.take_due(ms(1016)), vec![(TaskKind::Countdown, ms(1000))]);
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new();
        clock.advance(ms(250));
        clock.advance(ms(250));
        assert_eq!(clock.now(), ms(500));
        clock.set(ms(10));
        assert_eq!((&clock).now(), ms(10));
    }
}
