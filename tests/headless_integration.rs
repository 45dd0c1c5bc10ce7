use std::rc::Rc;
use std::sync::mpsc::{self, Sender};
use std::time::Duration;

use aimdrill::aim::AimPhase;
use aimdrill::app::{App, NoopCapture};
use aimdrill::auth::LocalIdentityProvider;
use aimdrill::config::FileSettingsStore;
use aimdrill::navigation::View;
use aimdrill::reaction::ReactionPhase;
use aimdrill::runtime::{AppEvent, FixedTicker, Runner, TestEventSource};
use aimdrill::scheduler::ManualClock;
use aimdrill::score_store::SqliteScoreStore;
use aimdrill::session::GameType;
use crossterm::event::{
    KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

// Headless integration using the internal runtime + App without a TTY.
// Events travel through Runner/TestEventSource exactly as the binary feeds them.
struct Harness {
    app: App,
    clock: Rc<ManualClock>,
    tx: Sender<AppEvent>,
    runner: Runner<TestEventSource, FixedTicker>,
    queued: usize,
    _dir: tempfile::TempDir,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("scores.db");
        let clock = Rc::new(ManualClock::new());

        let app = App::new(
            Box::new(LocalIdentityProvider::open(&db).unwrap()),
            Box::new(SqliteScoreStore::open(&db).unwrap()),
            Box::new(FileSettingsStore::with_path(
                dir.path().join("settings.json"),
            )),
            Box::new(NoopCapture),
            Box::new(clock.clone()),
        )
        .with_seed(42);

        let (tx, rx) = mpsc::channel();
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(5)),
        );

        let mut harness = Self {
            app,
            clock,
            tx,
            runner,
            queued: 0,
            _dir: dir,
        };
        harness.send(AppEvent::Resize(100, 40));
        harness.pump();
        harness
    }

    fn send(&mut self, event: AppEvent) {
        self.tx.send(event).unwrap();
        self.queued += 1;
    }

    fn key(&mut self, code: KeyCode) {
        self.send(AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn text(&mut self, s: &str) {
        for c in s.chars() {
            self.key(KeyCode::Char(c));
        }
    }

    fn click(&mut self) {
        self.send(AppEvent::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 10,
            row: 10,
            modifiers: KeyModifiers::NONE,
        }));
    }

    /// Delivers every queued event, then lets due timers fire
    fn pump(&mut self) {
        while self.queued > 0 {
            match self.runner.step() {
                AppEvent::Tick => {}
                AppEvent::Key(key) => self.app.on_key(key),
                AppEvent::Mouse(mouse) => self.app.on_mouse(mouse),
                AppEvent::Resize(w, h) => self.app.on_resize(w, h),
            }
            self.app.on_tick();
            self.queued -= 1;
        }
        self.app.on_tick();
    }

    fn advance(&mut self, ms: u64) {
        self.clock.advance(Duration::from_millis(ms));
        self.app.on_tick();
    }

    fn register(&mut self) {
        self.key(KeyCode::F(2));
        self.text("Neo");
        self.key(KeyCode::Tab);
        self.text("neo@example.com");
        self.key(KeyCode::Tab);
        self.text("secret1");
        self.key(KeyCode::Tab);
        self.text("secret1");
        self.key(KeyCode::Enter);
        self.pump();
    }

    fn open_menu_entry(&mut self, index: usize) {
        for _ in 0..6 {
            self.key(KeyCode::Up);
        }
        for _ in 0..index {
            self.key(KeyCode::Down);
        }
        self.key(KeyCode::Enter);
        self.pump();
    }
}

#[test]
fn headless_register_lands_on_menu() {
    let mut h = Harness::new();
    assert_eq!(h.app.view, View::Auth);

    h.register();
    assert_eq!(h.app.view, View::Menu);
    assert_eq!(h.app.current_user().unwrap().label(), "Neo");
}

#[test]
fn headless_mismatched_passwords_stay_on_form() {
    let mut h = Harness::new();
    h.key(KeyCode::F(2));
    h.text("Neo");
    h.key(KeyCode::Tab);
    h.text("neo@example.com");
    h.key(KeyCode::Tab);
    h.text("secret1");
    h.key(KeyCode::Tab);
    h.text("secret2");
    h.key(KeyCode::Enter);
    h.pump();

    assert_eq!(h.app.view, View::Auth);
    assert_eq!(
        h.app.auth_form.error.as_deref(),
        Some("Passwords do not match")
    );
}

#[test]
fn headless_reaction_round_is_recorded() {
    let mut h = Harness::new();
    h.register();
    h.open_menu_entry(1);
    assert_eq!(h.app.view, View::ReactionGame);

    h.key(KeyCode::Enter);
    h.pump();
    assert_eq!(h.app.reaction.phase(), ReactionPhase::Waiting);

    let mut waited = 0;
    while h.app.reaction.phase() == ReactionPhase::Waiting && waited < 7000 {
        h.advance(10);
        waited += 10;
    }
    assert_eq!(h.app.reaction.phase(), ReactionPhase::Stimulus);

    h.clock.advance(Duration::from_millis(240));
    h.click();
    h.pump();
    assert_eq!(h.app.reaction.phase(), ReactionPhase::Result);
    assert_eq!(h.app.reaction.reaction_time(), Some(240));
    assert!(h.app.reaction.last_was_record());

    h.key(KeyCode::Char('m'));
    h.pump();
    h.open_menu_entry(2);
    assert_eq!(h.app.view, View::Statistics);
    let stats = h.app.stats.stats.as_ref().unwrap();
    assert_eq!(stats.total_games, 1);
    assert_eq!(stats.best_score, Some(240.0));
    assert_eq!(stats.improvement, 0.0);
}

#[test]
fn headless_early_click_recovers_to_waiting() {
    let mut h = Harness::new();
    h.register();
    h.open_menu_entry(1);
    h.key(KeyCode::Enter);
    h.pump();

    // armed after 500ms, stimulus is at least 2s away
    h.advance(600);
    h.click();
    h.pump();
    assert_eq!(h.app.reaction.phase(), ReactionPhase::Early);

    h.advance(3000);
    assert_eq!(h.app.reaction.phase(), ReactionPhase::Waiting);
    assert!(!h.app.reaction.listener_armed());
}

#[test]
fn headless_aim_session_runs_to_completion() {
    let mut h = Harness::new();
    h.register();
    h.open_menu_entry(0);
    assert_eq!(h.app.view, View::AimGame);

    h.key(KeyCode::Enter);
    h.key(KeyCode::Enter);
    h.pump();
    assert_eq!(h.app.aim.phase(), AimPhase::Active);
    assert!(h.app.capture_engaged());
    assert_eq!(h.app.aim.targets().len(), 1);

    for _ in 0..3 {
        h.click();
    }
    h.pump();
    assert_eq!(h.app.aim.total_shots(), 3);
    assert_eq!(
        h.app.aim.score() + h.app.aim.missed_shots(),
        h.app.aim.total_shots()
    );

    for _ in 0..60 {
        h.advance(1000);
    }
    assert_eq!(h.app.aim.phase(), AimPhase::Finished);
    assert!(!h.app.capture_engaged());
    assert!(h.app.scheduler().is_empty());

    h.key(KeyCode::Char('m'));
    h.pump();
    h.open_menu_entry(2);
    h.key(KeyCode::Right);
    h.pump();
    assert_eq!(h.app.stats.tab, GameType::CircleTarget);
    assert_eq!(h.app.stats.stats.as_ref().unwrap().total_games, 1);
    assert_eq!(h.app.stats.best.len(), 1);
}

#[test]
fn headless_escape_mid_game_discards_session() {
    let mut h = Harness::new();
    h.register();
    h.open_menu_entry(0);
    h.key(KeyCode::Enter);
    h.key(KeyCode::Enter);
    h.pump();
    for _ in 0..5 {
        h.advance(1000);
    }
    assert_eq!(h.app.aim.time_left(), 55);

    h.key(KeyCode::Esc);
    h.pump();
    assert_eq!(h.app.view, View::Menu);
    assert!(h.app.scheduler().is_empty());

    h.advance(120_000);
    h.open_menu_entry(2);
    h.key(KeyCode::Right);
    h.pump();
    assert_eq!(h.app.stats.stats.as_ref().unwrap().total_games, 0);
}

#[test]
fn headless_menu_quits_on_escape() {
    let mut h = Harness::new();
    h.register();
    h.key(KeyCode::Esc);
    h.pump();
    assert!(h.app.should_quit);
}
