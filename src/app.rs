//! Application state and the effect executor.
//!
//! Game sessions decide *what* happens; `App` owns the scheduler, the stores
//! and the pointer capture and carries their effects out.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::aim::{AimEvent, AimPhase, AimSession, CursorPosition, Viewport};
use crate::auth::{AuthForm, IdentityProvider, User};
use crate::config::SettingsStore;
use crate::navigation::{resolve, MenuEntry, View};
use crate::reaction::{ReactionEvent, ReactionPhase, ReactionSession};
use crate::scheduler::{Clock, Scheduler, TaskKind};
use crate::score_store::{ScoreRecord, ScoreStore};
use crate::sensitivity::{parse_dpi, parse_sensitivity, SensitivitySettings};
use crate::session::{Effect, GameType, SessionSummary};
use crate::stats::{get_game_stats, GameStats};
use crate::ui::crosshair::{CrosshairLayer, CrosshairSurface};

/// Pixel size of one terminal cell, used to map the terminal onto a viewport
pub const CELL_WIDTH_PX: f64 = 8.0;
pub const CELL_HEIGHT_PX: f64 = 16.0;
/// Rows taken by the aiming HUD above the play area
pub const AIM_HUD_ROWS: u16 = 1;

/// Exclusive pointer capture. Engaging may fail; callers must cope.
pub trait PointerCapture {
    fn engage(&mut self) -> std::io::Result<()>;
    fn release(&mut self) -> std::io::Result<()>;
}

/// Capture that always succeeds and does nothing, for headless use
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCapture;

impl PointerCapture for NoopCapture {
    fn engage(&mut self) -> std::io::Result<()> {
        Ok(())
    }

    fn release(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MenuState {
    pub selected: usize,
    pub editing: Option<MenuEntry>,
    pub input: String,
    pub error: Option<String>,
    pub settings: SensitivitySettings,
}

impl MenuState {
    pub fn selected_entry(&self) -> MenuEntry {
        MenuEntry::ALL[self.selected.min(MenuEntry::ALL.len() - 1)]
    }
}

#[derive(Debug, Clone)]
pub struct StatsState {
    pub tab: GameType,
    pub stats: Option<GameStats>,
    pub best: Vec<ScoreRecord>,
    pub error: Option<String>,
}

impl Default for StatsState {
    fn default() -> Self {
        Self {
            tab: GameType::ReactionTime,
            stats: None,
            best: Vec::new(),
            error: None,
        }
    }
}

pub struct App {
    pub view: View,
    pub auth_form: AuthForm,
    pub menu: MenuState,
    pub aim: AimSession,
    pub reaction: ReactionSession,
    pub stats: StatsState,
    pub crosshair: CrosshairLayer,
    pub should_quit: bool,
    scheduler: Scheduler,
    identity: Box<dyn IdentityProvider>,
    scores: Box<dyn ScoreStore>,
    settings: Box<dyn SettingsStore>,
    capture: Box<dyn PointerCapture>,
    capture_engaged: bool,
    clock: Box<dyn Clock>,
    rng: StdRng,
    terminal_size: (u16, u16),
    last_mouse: Option<(u16, u16)>,
    /// The task being dispatched and when it was due
    firing: Option<(TaskKind, Duration)>,
}

impl App {
    pub fn new(
        identity: Box<dyn IdentityProvider>,
        scores: Box<dyn ScoreStore>,
        settings: Box<dyn SettingsStore>,
        capture: Box<dyn PointerCapture>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let sensitivity = settings.load_sensitivity_settings();
        let best_time = settings.best_reaction_time();
        let mut app = Self {
            view: View::Auth,
            auth_form: AuthForm::default(),
            menu: MenuState {
                settings: sensitivity,
                ..MenuState::default()
            },
            aim: AimSession::new(sensitivity.sensitivity, Viewport::default()),
            reaction: ReactionSession::new(best_time),
            stats: StatsState::default(),
            crosshair: CrosshairLayer::default(),
            should_quit: false,
            scheduler: Scheduler::new(),
            identity,
            scores,
            settings,
            capture,
            capture_engaged: false,
            clock,
            rng: StdRng::from_entropy(),
            terminal_size: (0, 0),
            last_mouse: None,
            firing: None,
        };
        app.navigate(View::Menu);
        app
    }

    /// Fixes the random source, for reproducible runs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn current_user(&self) -> Option<&User> {
        self.identity.current_user()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn capture_engaged(&self) -> bool {
        self.capture_engaged
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn scores(&self) -> &dyn ScoreStore {
        self.scores.as_ref()
    }

    /// The aiming play area in pixels for the current terminal size
    pub fn aim_viewport(&self) -> Viewport {
        let (cols, rows) = self.terminal_size;
        Viewport::new(
            cols as f64 * CELL_WIDTH_PX,
            rows.saturating_sub(AIM_HUD_ROWS) as f64 * CELL_HEIGHT_PX,
        )
    }

    pub fn navigate(&mut self, requested: View) {
        let target = resolve(requested, self.identity.current_user());

        // no timer or capture outlives the view that started it
        self.scheduler.cancel_all();
        self.release_capture();

        match target {
            View::Auth => {
                let email = self.auth_form.email.clone();
                self.auth_form = AuthForm::default();
                self.auth_form.email = email;
            }
            View::Menu => {
                self.menu.settings = self.settings.load_sensitivity_settings();
                self.menu.editing = None;
                self.menu.error = None;
            }
            View::AimGame => {
                let sensitivity = self.settings.load_sensitivity_settings().sensitivity;
                self.aim = AimSession::new(sensitivity, self.aim_viewport());
                self.crosshair.place(CursorPosition::default());
                debug!("aim game ready at sensitivity {}", sensitivity);
            }
            View::ReactionGame => {
                self.reaction = ReactionSession::new(self.settings.best_reaction_time());
                // clicks need mouse reporting; space and enter work without it
                match self.capture.engage() {
                    Ok(()) => {
                        self.capture_engaged = true;
                        self.last_mouse = None;
                    }
                    Err(err) => warn!("mouse reporting unavailable: {}", err),
                }
            }
            View::Statistics => self.load_stats(),
        }

        if target != self.view {
            debug!("view {} -> {}", self.view, target);
        }
        self.view = target;
    }

    pub fn load_stats(&mut self) {
        let Some(user_id) = self.identity.current_user().map(|u| u.id.clone()) else {
            return;
        };
        let tab = self.stats.tab;

        let loaded = get_game_stats(self.scores.as_ref(), &user_id, tab).and_then(|stats| {
            self.scores
                .best_scores(&user_id, tab)
                .map(|best| (stats, best))
        });

        match loaded {
            Ok((stats, best)) => {
                self.stats.stats = Some(stats);
                self.stats.best = best;
                self.stats.error = None;
            }
            Err(err) => {
                warn!("could not load {} statistics: {}", tab, err);
                self.stats.stats = None;
                self.stats.best.clear();
                self.stats.error = Some("Statistics could not be loaded".to_string());
            }
        }
    }

    /// Fires every timer that is due and feeds it to the active game
    pub fn on_tick(&mut self) {
        let now = self.clock.now();
        for (kind, due) in self.scheduler.take_due(now) {
            let view = self.view;
            self.firing = Some((kind, due));
            self.dispatch_task(kind);
            self.firing = None;
            if self.view != view {
                break;
            }
        }
    }

    fn dispatch_task(&mut self, kind: TaskKind) {
        match self.view {
            View::AimGame => self.aim_event(AimEvent::TaskDue(kind)),
            View::ReactionGame => self.reaction_event(ReactionEvent::TaskDue(kind)),
            _ => debug!("dropping stray {} task", kind),
        }
    }

    pub fn aim_event(&mut self, event: AimEvent) {
        let effects = self.aim.handle(event, &mut self.rng);
        self.apply(effects);
    }

    pub fn reaction_event(&mut self, event: ReactionEvent) {
        let now = self.clock.now();
        let effects = self.reaction.handle(event, now, &mut self.rng);
        self.apply(effects);
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Schedule(kind, after) => {
                    // a task re-arming itself counts from its due time, not from the late tick
                    let from = match self.firing {
                        Some((firing, due)) if firing == kind => due,
                        _ => self.clock.now(),
                    };
                    self.scheduler.schedule(kind, from, after);
                }
                Effect::Cancel(kind) => self.scheduler.cancel(kind),
                Effect::CancelAll => self.scheduler.cancel_all(),
                Effect::EngageCapture => self.engage_capture(),
                Effect::ReleaseCapture => self.release_capture(),
                Effect::MoveCrosshair(pos) => self.crosshair.place(pos),
                Effect::Persist(summary) => self.persist(&summary),
                Effect::StoreBestTime(ms) => {
                    if let Err(err) = self.settings.record_best_reaction_time(ms) {
                        warn!("could not store best reaction time: {}", err);
                    }
                }
                Effect::ExitToMenu => self.navigate(View::Menu),
            }
        }
    }

    fn engage_capture(&mut self) {
        match self.capture.engage() {
            Ok(()) => {
                info!("pointer capture engaged");
                self.capture_engaged = true;
                self.last_mouse = None;
                self.aim_event(AimEvent::CaptureEngaged);
            }
            Err(err) => {
                warn!("pointer capture failed: {}", err);
                self.capture_engaged = false;
                self.aim_event(AimEvent::CaptureFailed);
            }
        }
    }

    fn release_capture(&mut self) {
        if !self.capture_engaged {
            return;
        }
        if let Err(err) = self.capture.release() {
            warn!("pointer capture release failed: {}", err);
        }
        self.capture_engaged = false;
        self.last_mouse = None;
        if self.aim.is_captured() {
            let effects = self.aim.handle(AimEvent::CaptureReleased, &mut self.rng);
            self.apply(effects);
        }
    }

    /// Fire and forget: a failed save is logged and the game carries on
    fn persist(&mut self, summary: &SessionSummary) {
        let Some(user_id) = self.identity.current_user().map(|u| u.id.clone()) else {
            return;
        };
        match self.scores.append(&user_id, summary) {
            Ok(id) => info!("saved {} session {}", summary.game_type(), id),
            Err(err) => warn!("could not save {} session: {}", summary.game_type(), err),
        }
    }

    pub fn on_resize(&mut self, cols: u16, rows: u16) {
        self.terminal_size = (cols, rows);
        if self.view == View::AimGame {
            let viewport = self.aim_viewport();
            self.aim_event(AimEvent::Resize(viewport));
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.view {
            View::Auth => self.auth_key(key),
            View::Menu => self.menu_key(key),
            View::AimGame => self.aim_key(key),
            View::ReactionGame => self.reaction_key(key),
            View::Statistics => self.stats_key(key),
        }
    }

    pub fn on_mouse(&mut self, mouse: MouseEvent) {
        match (self.view, mouse.kind) {
            (View::AimGame, MouseEventKind::Moved | MouseEventKind::Drag(MouseButton::Left)) => {
                let pos = (mouse.column, mouse.row);
                if let Some((last_col, last_row)) = self.last_mouse.replace(pos) {
                    let dx = (pos.0 as f64 - last_col as f64) * CELL_WIDTH_PX;
                    let dy = (pos.1 as f64 - last_row as f64) * CELL_HEIGHT_PX;
                    if dx != 0.0 || dy != 0.0 {
                        self.aim_event(AimEvent::PointerMotion { dx, dy });
                    }
                }
            }
            (View::AimGame, MouseEventKind::Down(MouseButton::Left)) => {
                self.last_mouse = Some((mouse.column, mouse.row));
                self.aim_event(AimEvent::Click);
            }
            (View::ReactionGame, MouseEventKind::Down(MouseButton::Left)) => {
                self.reaction_event(ReactionEvent::Click);
            }
            _ => {}
        }
    }

    fn auth_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::Down => self.auth_form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.auth_form.focus_prev(),
            KeyCode::F(2) => self.auth_form.toggle_mode(),
            KeyCode::Backspace => self.auth_form.pop_char(),
            KeyCode::Enter => {
                if self.auth_form.submit(self.identity.as_mut()) {
                    self.navigate(View::Menu);
                }
            }
            KeyCode::Char(c) => self.auth_form.push_char(c),
            _ => {}
        }
    }

    fn menu_key(&mut self, key: KeyEvent) {
        if let Some(entry) = self.menu.editing {
            match key.code {
                KeyCode::Esc => {
                    self.menu.editing = None;
                    self.menu.error = None;
                }
                KeyCode::Enter => self.commit_menu_edit(entry),
                KeyCode::Backspace => {
                    self.menu.input.pop();
                }
                KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => {
                    self.menu.input.push(c);
                    self.menu.error = None;
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => {
                self.menu.selected = self.menu.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.menu.selected = (self.menu.selected + 1).min(MenuEntry::ALL.len() - 1);
            }
            KeyCode::Enter => self.activate_menu_entry(self.menu.selected_entry()),
            _ => {}
        }
    }

    fn activate_menu_entry(&mut self, entry: MenuEntry) {
        if let Some(view) = entry.view() {
            self.navigate(view);
            return;
        }
        match entry {
            MenuEntry::Sensitivity => {
                self.menu.input = self.menu.settings.sensitivity.to_string();
                self.menu.editing = Some(entry);
            }
            MenuEntry::Dpi => {
                self.menu.input = self.menu.settings.dpi.to_string();
                self.menu.editing = Some(entry);
            }
            MenuEntry::Logout => match self.identity.logout() {
                Ok(()) => self.navigate(View::Auth),
                Err(err) => warn!("logout failed: {}", err.code),
            },
            _ => {}
        }
    }

    fn commit_menu_edit(&mut self, entry: MenuEntry) {
        let mut settings = self.menu.settings;
        let parsed = match entry {
            MenuEntry::Sensitivity => parse_sensitivity(&self.menu.input).map(|s| {
                settings.sensitivity = s;
            }),
            MenuEntry::Dpi => parse_dpi(&self.menu.input).map(|d| {
                settings.dpi = d;
            }),
            _ => Ok(()),
        };

        match parsed {
            Ok(()) => {
                if let Err(err) = self
                    .settings
                    .save_sensitivity_settings(settings.sensitivity, settings.dpi)
                {
                    warn!("could not save sensitivity settings: {}", err);
                }
                self.menu.settings = settings;
                self.menu.editing = None;
                self.menu.error = None;
            }
            Err(err) => self.menu.error = Some(err.to_string()),
        }
    }

    fn aim_key(&mut self, key: KeyEvent) {
        let phase = self.aim.phase();
        match key.code {
            KeyCode::Esc => self.aim_event(AimEvent::Escape),
            KeyCode::Enter | KeyCode::Char(' ') if phase != AimPhase::Active => {
                self.aim_event(AimEvent::Start)
            }
            KeyCode::Char('m') if phase != AimPhase::Active => self.navigate(View::Menu),
            KeyCode::Enter | KeyCode::Char('c') if !self.aim.is_captured() => {
                self.aim_event(AimEvent::RequestCapture)
            }
            KeyCode::Char(' ') => self.aim_event(AimEvent::Click),
            _ => {}
        }
    }

    fn reaction_key(&mut self, key: KeyEvent) {
        let idle = matches!(
            self.reaction.phase(),
            ReactionPhase::Start | ReactionPhase::Result
        );
        match key.code {
            KeyCode::Esc => self.reaction_event(ReactionEvent::Escape),
            KeyCode::Enter | KeyCode::Char(' ') if idle => {
                self.reaction_event(ReactionEvent::Start)
            }
            KeyCode::Char('m') if idle => self.navigate(View::Menu),
            KeyCode::Enter | KeyCode::Char(' ') => self.reaction_event(ReactionEvent::Click),
            _ => {}
        }
    }

    fn stats_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('b') | KeyCode::Char('m') => self.navigate(View::Menu),
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab => {
                self.stats.tab = match self.stats.tab {
                    GameType::ReactionTime => GameType::CircleTarget,
                    GameType::CircleTarget => GameType::ReactionTime,
                };
                self.load_stats();
            }
            KeyCode::Char('r') => self.load_stats(),
            _ => {}
        }
    }
}
