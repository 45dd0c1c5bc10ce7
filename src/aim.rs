//! Circle-target aiming game.
//!
//! One live target at a time, a 60 second countdown, and a crosshair driven by
//! relative pointer motion while the pointer is captured. Transitions mutate the
//! session and return the effects the app has to carry out.

use rand::Rng;
use std::time::Duration;

use crate::scheduler::TaskKind;
use crate::sensitivity::{calculate_movement, CONVERSION_FACTOR};
use crate::session::{AimSummary, Effect, SessionSummary, AIM_GAME_SECS};

/// Target diameter in pixels
pub const TARGET_SIZE: f64 = 50.0;
pub const TARGET_BREAK_MS: u64 = 300;
pub const COUNTDOWN_TICK_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Crosshair position in percent of the viewport, each axis in `[0, 100]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorPosition {
    pub x: f64,
    pub y: f64,
}

impl Default for CursorPosition {
    fn default() -> Self {
        Self { x: 50.0, y: 50.0 }
    }
}

impl CursorPosition {
    pub fn nudge(&mut self, dx: f64, dy: f64) {
        self.x = (self.x + dx).clamp(0.0, 100.0);
        self.y = (self.y + dy).clamp(0.0, 100.0);
    }

    pub fn to_pixels(&self, viewport: Viewport) -> (f64, f64) {
        (
            (self.x / 100.0) * viewport.width,
            (self.y / 100.0) * viewport.height,
        )
    }
}

/// `x`/`y` is the top-left corner of the target's square footprint
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub breaking: bool,
}

impl Target {
    pub fn center(&self) -> (f64, f64) {
        (self.x + TARGET_SIZE / 2.0, self.y + TARGET_SIZE / 2.0)
    }

    pub fn is_hit_by(&self, px: f64, py: f64) -> bool {
        let (cx, cy) = self.center();
        let distance = ((px - cx).powi(2) + (py - cy).powi(2)).sqrt();
        distance <= TARGET_SIZE / 2.0 && !self.breaking
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AimPhase {
    Idle,
    Active,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AimEvent {
    Start,
    TaskDue(TaskKind),
    PointerMotion { dx: f64, dy: f64 },
    Click,
    RequestCapture,
    CaptureEngaged,
    CaptureReleased,
    CaptureFailed,
    Resize(Viewport),
    Escape,
}

#[derive(Debug, Clone)]
pub struct AimSession {
    phase: AimPhase,
    captured: bool,
    score: u32,
    total_shots: u32,
    missed_shots: u32,
    time_left: u32,
    targets: Vec<Target>,
    respawn_pending: bool,
    cursor: CursorPosition,
    viewport: Viewport,
    sensitivity: f64,
    next_target_id: u64,
    last_summary: Option<AimSummary>,
}

impl AimSession {
    pub fn new(sensitivity: f64, viewport: Viewport) -> Self {
        Self {
            phase: AimPhase::Idle,
            captured: false,
            score: 0,
            total_shots: 0,
            missed_shots: 0,
            time_left: AIM_GAME_SECS,
            targets: Vec::new(),
            respawn_pending: false,
            cursor: CursorPosition::default(),
            viewport,
            sensitivity,
            next_target_id: 0,
            last_summary: None,
        }
    }

    pub fn phase(&self) -> AimPhase {
        self.phase
    }

    pub fn is_captured(&self) -> bool {
        self.captured
    }

    /// The blocking overlay is up whenever play is running without capture
    pub fn overlay_visible(&self) -> bool {
        self.phase == AimPhase::Active && !self.captured
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn total_shots(&self) -> u32 {
        self.total_shots
    }

    pub fn missed_shots(&self) -> u32 {
        self.missed_shots
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn cursor(&self) -> CursorPosition {
        self.cursor
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    pub fn last_summary(&self) -> Option<&AimSummary> {
        self.last_summary.as_ref()
    }

    pub fn handle<R: Rng + ?Sized>(&mut self, event: AimEvent, rng: &mut R) -> Vec<Effect> {
        match event {
            AimEvent::Start => self.start(rng),
            AimEvent::TaskDue(TaskKind::Countdown) => self.on_countdown(),
            AimEvent::TaskDue(TaskKind::TargetRespawn) => self.on_respawn(rng),
            AimEvent::TaskDue(_) => vec![],
            AimEvent::PointerMotion { dx, dy } => self.on_motion(dx, dy),
            AimEvent::Click => self.on_click(),
            AimEvent::RequestCapture => self.request_capture(),
            AimEvent::CaptureEngaged => {
                self.captured = self.phase == AimPhase::Active;
                if self.captured {
                    vec![]
                } else {
                    vec![Effect::ReleaseCapture]
                }
            }
            AimEvent::CaptureReleased | AimEvent::CaptureFailed => {
                self.captured = false;
                vec![]
            }
            AimEvent::Resize(viewport) => self.on_resize(viewport, rng),
            AimEvent::Escape => self.escape(),
        }
    }

    fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<Effect> {
        if self.phase == AimPhase::Active {
            return vec![];
        }

        self.phase = AimPhase::Active;
        self.score = 0;
        self.total_shots = 0;
        self.missed_shots = 0;
        self.time_left = AIM_GAME_SECS;
        self.targets.clear();
        self.respawn_pending = false;
        self.cursor = CursorPosition::default();
        self.last_summary = None;

        if !self.viewport.is_empty() {
            let target = self.spawn_target(rng);
            self.targets.push(target);
        }

        vec![
            Effect::Cancel(TaskKind::TargetRespawn),
            Effect::Schedule(
                TaskKind::Countdown,
                Duration::from_millis(COUNTDOWN_TICK_MS),
            ),
            Effect::MoveCrosshair(self.cursor),
        ]
    }

    fn on_countdown(&mut self) -> Vec<Effect> {
        if self.phase != AimPhase::Active {
            return vec![];
        }

        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left > 0 {
            return vec![Effect::Schedule(
                TaskKind::Countdown,
                Duration::from_millis(COUNTDOWN_TICK_MS),
            )];
        }

        self.finish()
    }

    fn finish(&mut self) -> Vec<Effect> {
        self.phase = AimPhase::Finished;
        self.targets.clear();
        self.respawn_pending = false;

        let summary = AimSummary::new(self.score, self.total_shots, self.missed_shots);
        self.last_summary = Some(summary.clone());

        let mut effects = vec![Effect::Cancel(TaskKind::TargetRespawn)];
        if self.captured {
            self.captured = false;
            effects.push(Effect::ReleaseCapture);
        }
        effects.push(Effect::Persist(SessionSummary::CircleTarget(summary)));
        effects
    }

    fn on_respawn<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<Effect> {
        if self.phase != AimPhase::Active {
            return vec![];
        }
        self.respawn_pending = false;
        let target = self.spawn_target(rng);
        self.targets = vec![target];
        vec![]
    }

    fn on_motion(&mut self, dx: f64, dy: f64) -> Vec<Effect> {
        if self.phase != AimPhase::Active || !self.captured {
            return vec![];
        }
        let rotation = calculate_movement(dx, dy, self.sensitivity);
        self.cursor
            .nudge(rotation.x * CONVERSION_FACTOR, rotation.y * CONVERSION_FACTOR);
        vec![Effect::MoveCrosshair(self.cursor)]
    }

    fn on_click(&mut self) -> Vec<Effect> {
        if self.phase != AimPhase::Active {
            return vec![];
        }
        if !self.captured {
            return self.request_capture();
        }

        self.total_shots += 1;
        let (px, py) = self.cursor.to_pixels(self.viewport);

        let mut hit = false;
        for target in self.targets.iter_mut() {
            if target.is_hit_by(px, py) {
                target.breaking = true;
                hit = true;
            }
        }

        if hit {
            self.score += 1;
            self.respawn_pending = true;
            vec![Effect::Schedule(
                TaskKind::TargetRespawn,
                Duration::from_millis(TARGET_BREAK_MS),
            )]
        } else {
            self.missed_shots += 1;
            vec![]
        }
    }

    fn request_capture(&mut self) -> Vec<Effect> {
        if self.phase == AimPhase::Active && !self.captured {
            vec![Effect::EngageCapture]
        } else {
            vec![]
        }
    }

    fn on_resize<R: Rng + ?Sized>(&mut self, viewport: Viewport, rng: &mut R) -> Vec<Effect> {
        self.viewport = viewport;
        if self.phase == AimPhase::Active
            && self.targets.is_empty()
            && !self.respawn_pending
            && !viewport.is_empty()
        {
            let target = self.spawn_target(rng);
            self.targets.push(target);
        }
        vec![]
    }

    fn escape(&mut self) -> Vec<Effect> {
        let mut effects = vec![Effect::CancelAll];
        if self.captured {
            effects.push(Effect::ReleaseCapture);
        }
        effects.push(Effect::ExitToMenu);

        self.phase = AimPhase::Idle;
        self.captured = false;
        self.targets.clear();
        self.respawn_pending = false;
        effects
    }

    fn spawn_target<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Target {
        self.next_target_id += 1;
        Target {
            id: self.next_target_id,
            x: random_coordinate(self.viewport.width, rng),
            y: random_coordinate(self.viewport.height, rng),
            breaking: false,
        }
    }
}

/// Uniform in `[size/2, dimension - size*1.5]`, so the whole footprint stays visible
fn random_coordinate<R: Rng + ?Sized>(dimension: f64, rng: &mut R) -> f64 {
    let low = TARGET_SIZE / 2.0;
    let high = dimension - TARGET_SIZE * 1.5;
    if high > low {
        rng.gen_range(low..=high)
    } else {
        low
    }
}
