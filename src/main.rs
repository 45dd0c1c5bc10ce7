use aimdrill::{
    app::{App, PointerCapture},
    app_dirs::AppDirs,
    auth::{AuthForm, LocalIdentityProvider},
    config::FileSettingsStore,
    runtime::{AppEvent, AppEventSource, CrosstermEventSource, FixedTicker, Runner, Ticker},
    scheduler::MonotonicClock,
    score_store::{write_csv, ScoreQuery, ScoreStore, SqliteScoreStore},
};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, File, OpenOptions},
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const TICK_RATE_MS: u64 = 16;

/// aim and reaction-time trainer for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Train mouse aim and reaction time in the terminal. Sessions are stored locally and summarised with progress charts."
)]
pub struct Cli {
    /// score and account database (defaults to the state directory)
    #[clap(long)]
    db_path: Option<PathBuf>,

    /// settings file (defaults to the config directory)
    #[clap(long)]
    settings_path: Option<PathBuf>,

    /// log file (defaults to the state directory)
    #[clap(long)]
    log_path: Option<PathBuf>,

    /// milliseconds between timer checks
    #[clap(long, default_value_t = TICK_RATE_MS)]
    tick_ms: u64,

    /// write the account's session history to this CSV file and exit
    #[clap(long, requires = "email")]
    export_csv: Option<PathBuf>,

    /// account email, pre-filled on the sign-in form
    #[clap(short = 'e', long)]
    email: Option<String>,
}

/// Exclusive pointer capture backed by terminal mouse reporting
struct MouseCapture;

impl PointerCapture for MouseCapture {
    fn engage(&mut self) -> io::Result<()> {
        execute!(io::stdout(), EnableMouseCapture)
    }

    fn release(&mut self) -> io::Result<()> {
        execute!(io::stdout(), DisableMouseCapture)
    }
}

fn init_logging(path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    // the terminal belongs to the TUI, so logs go to a file
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn export_history(
    identity: &LocalIdentityProvider,
    scores: &SqliteScoreStore,
    email: &str,
    out: &Path,
) -> Result<usize, Box<dyn Error>> {
    let user = identity
        .lookup(email)?
        .ok_or_else(|| format!("no account registered for {email}"))?;
    let records = scores.query(&ScoreQuery::new(user.id, None), usize::MAX)?;
    write_csv(&records, File::create(out)?)?;
    info!("exported {} sessions to {}", records.len(), out.display());
    Ok(records.len())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(log_path) = cli.log_path.clone().or_else(AppDirs::log_path) {
        init_logging(&log_path)?;
    }

    let db_path = cli
        .db_path
        .clone()
        .or_else(AppDirs::db_path)
        .ok_or("could not determine a state directory, pass --db-path")?;
    let scores = SqliteScoreStore::open(&db_path)?;
    let identity = LocalIdentityProvider::open(&db_path)?;

    if let Some(out) = &cli.export_csv {
        let email = cli.email.as_deref().unwrap_or_default();
        let count = export_history(&identity, &scores, email, out)?;
        println!("exported {} sessions to {}", count, out.display());
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let settings = match &cli.settings_path {
        Some(path) => FileSettingsStore::with_path(path),
        None => FileSettingsStore::new(),
    };

    let mut app = App::new(
        Box::new(identity),
        Box::new(scores),
        Box::new(settings),
        Box::new(MouseCapture),
        Box::new(MonotonicClock::new()),
    );
    if let Some(email) = &cli.email {
        app.auth_form = AuthForm::with_email(email.as_str());
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(cli.tick_ms.max(1))),
    );
    info!("aimdrill started, database at {}", db_path.display());
    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: AppEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    let size = terminal.size()?;
    app.on_resize(size.width, size.height);

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.step() {
            AppEvent::Tick => {}
            AppEvent::Key(key) => app.on_key(key),
            AppEvent::Mouse(mouse) => app.on_mouse(mouse),
            AppEvent::Resize(width, height) => app.on_resize(width, height),
        }
        // a stream of mouse events must not starve the timers
        app.on_tick();

        if app.should_quit {
            break;
        }
    }

    info!("aimdrill exiting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aimdrill::session::{AimSummary, ReactionSummary, SessionSummary};
    use aimdrill::auth::IdentityProvider;
    use clap::Parser;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["aimdrill"]);

        assert_eq!(cli.db_path, None);
        assert_eq!(cli.settings_path, None);
        assert_eq!(cli.log_path, None);
        assert_eq!(cli.tick_ms, TICK_RATE_MS);
        assert_eq!(cli.export_csv, None);
        assert_eq!(cli.email, None);
    }

    #[test]
    fn test_cli_paths() {
        let cli = Cli::parse_from([
            "aimdrill",
            "--db-path",
            "/tmp/a.db",
            "--settings-path",
            "/tmp/s.json",
            "--log-path",
            "/tmp/a.log",
        ]);
        assert_eq!(cli.db_path, Some(PathBuf::from("/tmp/a.db")));
        assert_eq!(cli.settings_path, Some(PathBuf::from("/tmp/s.json")));
        assert_eq!(cli.log_path, Some(PathBuf::from("/tmp/a.log")));
    }

    #[test]
    fn test_cli_tick_ms() {
        let cli = Cli::parse_from(["aimdrill", "--tick-ms", "5"]);
        assert_eq!(cli.tick_ms, 5);
    }

    #[test]
    fn test_cli_email_short_and_long() {
        let cli = Cli::parse_from(["aimdrill", "-e", "a@b.io"]);
        assert_eq!(cli.email.as_deref(), Some("a@b.io"));

        let cli = Cli::parse_from(["aimdrill", "--email", "c@d.io"]);
        assert_eq!(cli.email.as_deref(), Some("c@d.io"));
    }

    #[test]
    fn test_cli_export_requires_email() {
        let err = Cli::try_parse_from(["aimdrill", "--export-csv", "out.csv"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let cli =
            Cli::try_parse_from(["aimdrill", "--export-csv", "out.csv", "-e", "a@b.io"]).unwrap();
        assert_eq!(cli.export_csv, Some(PathBuf::from("out.csv")));
    }

    #[test]
    fn test_cli_rejects_bad_tick() {
        assert!(Cli::try_parse_from(["aimdrill", "--tick-ms", "soon"]).is_err());
    }

    #[test]
    fn test_export_history_writes_rows() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("scores.db");
        let out = dir.path().join("history.csv");

        let scores = SqliteScoreStore::open(&db).unwrap();
        let mut identity = LocalIdentityProvider::open(&db).unwrap();
        identity.register("csv@x.io", "secret1", "Csv").unwrap();
        let user_id = identity.current_user().unwrap().id.clone();

        scores
            .append(
                &user_id,
                &SessionSummary::CircleTarget(AimSummary::new(30, 40, 10)),
            )
            .unwrap();
        scores
            .append(
                &user_id,
                &SessionSummary::ReactionTime(ReactionSummary {
                    reaction_time: 215,
                    is_new_record: true,
                }),
            )
            .unwrap();

        let count = export_history(&identity, &scores, "csv@x.io", &out).unwrap();
        assert_eq!(count, 2);

        let text = fs::read_to_string(&out).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("215"));
    }

    #[test]
    fn test_export_history_unknown_account() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("scores.db");
        let scores = SqliteScoreStore::open(&db).unwrap();
        let identity = LocalIdentityProvider::open(&db).unwrap();

        let err = export_history(&identity, &scores, "ghost@x.io", &dir.path().join("o.csv"))
            .unwrap_err();
        assert!(err.to_string().contains("ghost@x.io"));
    }
}
