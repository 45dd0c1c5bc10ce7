//! Reaction-time game: wait on a white screen, click as soon as it turns blue.

use rand::Rng;
use std::time::Duration;

use crate::scheduler::TaskKind;
use crate::session::{Effect, ReactionSummary, SessionSummary};

pub const START_DEBOUNCE_MS: u64 = 300;
pub const LISTENER_ARM_MS: u64 = 500;
pub const EARLY_RECOVERY_MS: u64 = 3000;
pub const MIN_STIMULUS_DELAY_MS: u64 = 2000;
pub const MAX_STIMULUS_DELAY_MS: u64 = 6000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionPhase {
    Start,
    Waiting,
    /// The screen is blue, the clock is running
    Stimulus,
    Result,
    Early,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionEvent {
    Start,
    TaskDue(TaskKind),
    Click,
    Escape,
}

#[derive(Debug, Clone)]
pub struct ReactionSession {
    phase: ReactionPhase,
    listener_armed: bool,
    stimulus_at: Option<Duration>,
    reaction_time: Option<u64>,
    best_time: Option<u64>,
    last_was_record: bool,
}

impl ReactionSession {
    pub fn new(best_time: Option<u64>) -> Self {
        Self {
            phase: ReactionPhase::Start,
            listener_armed: false,
            stimulus_at: None,
            reaction_time: None,
            best_time,
            last_was_record: false,
        }
    }

    pub fn phase(&self) -> ReactionPhase {
        self.phase
    }

    pub fn listener_armed(&self) -> bool {
        self.listener_armed
    }

    pub fn reaction_time(&self) -> Option<u64> {
        self.reaction_time
    }

    pub fn best_time(&self) -> Option<u64> {
        self.best_time
    }

    pub fn last_was_record(&self) -> bool {
        self.last_was_record
    }

    pub fn handle<R: Rng + ?Sized>(
        &mut self,
        event: ReactionEvent,
        now: Duration,
        rng: &mut R,
    ) -> Vec<Effect> {
        match (self.phase, event) {
            (_, ReactionEvent::Escape) => self.escape(),
            (ReactionPhase::Start | ReactionPhase::Result, ReactionEvent::Start) => {
                self.begin_waiting()
            }
            (ReactionPhase::Waiting, ReactionEvent::TaskDue(TaskKind::StartDebounce)) => {
                let delay = rng.gen_range(MIN_STIMULUS_DELAY_MS..=MAX_STIMULUS_DELAY_MS);
                tracing::debug!("stimulus in {delay}ms");
                vec![Effect::Schedule(
                    TaskKind::Stimulus,
                    Duration::from_millis(delay),
                )]
            }
            (ReactionPhase::Waiting, ReactionEvent::TaskDue(TaskKind::ListenerArm)) => {
                self.listener_armed = true;
                vec![]
            }
            (ReactionPhase::Waiting, ReactionEvent::TaskDue(TaskKind::Stimulus)) => {
                self.phase = ReactionPhase::Stimulus;
                self.stimulus_at = Some(now);
                // no attachment delay once the screen is blue
                self.listener_armed = true;
                vec![Effect::Cancel(TaskKind::ListenerArm)]
            }
            (ReactionPhase::Waiting, ReactionEvent::Click) if self.listener_armed => {
                self.phase = ReactionPhase::Early;
                self.listener_armed = false;
                vec![
                    Effect::Cancel(TaskKind::Stimulus),
                    Effect::Cancel(TaskKind::StartDebounce),
                    Effect::Schedule(
                        TaskKind::EarlyRecovery,
                        Duration::from_millis(EARLY_RECOVERY_MS),
                    ),
                ]
            }
            (ReactionPhase::Early, ReactionEvent::TaskDue(TaskKind::EarlyRecovery)) => {
                self.begin_waiting()
            }
            (ReactionPhase::Stimulus, ReactionEvent::Click) => self.record(now),
            _ => vec![],
        }
    }

    fn begin_waiting(&mut self) -> Vec<Effect> {
        self.phase = ReactionPhase::Waiting;
        self.listener_armed = false;
        self.stimulus_at = None;
        self.reaction_time = None;
        self.last_was_record = false;
        vec![
            Effect::CancelAll,
            Effect::Schedule(
                TaskKind::StartDebounce,
                Duration::from_millis(START_DEBOUNCE_MS),
            ),
            Effect::Schedule(
                TaskKind::ListenerArm,
                Duration::from_millis(LISTENER_ARM_MS),
            ),
        ]
    }

    fn record(&mut self, now: Duration) -> Vec<Effect> {
        let started = self.stimulus_at.unwrap_or(now);
        let reaction = now.saturating_sub(started).as_millis() as u64;

        self.phase = ReactionPhase::Result;
        self.listener_armed = false;
        self.reaction_time = Some(reaction);

        let is_new_record = self.best_time.map_or(true, |best| reaction < best);
        self.last_was_record = is_new_record;

        let mut effects = Vec::with_capacity(2);
        if is_new_record {
            self.best_time = Some(reaction);
            effects.push(Effect::StoreBestTime(reaction));
        }
        effects.push(Effect::Persist(SessionSummary::ReactionTime(
            ReactionSummary {
                reaction_time: reaction,
                is_new_record,
            },
        )));
        effects
    }

    fn escape(&mut self) -> Vec<Effect> {
        self.phase = ReactionPhase::Start;
        self.listener_armed = false;
        self.stimulus_at = None;
        vec![Effect::CancelAll, Effect::ExitToMenu]
    }
}
