use chrono::{DateTime, SecondsFormat, Utc};
use itertools::Itertools;
use rusqlite::{params, Connection};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::error::{AppError, Result};
use crate::session::{GameType, SessionSummary};

pub type RecordId = i64;

/// Sessions the statistics screen aggregates over
pub const HISTORY_LIMIT: usize = 100;
/// Size of the best-scores leaderboard
pub const BEST_SCORES_LIMIT: usize = 10;

/// A persisted session. Never updated or deleted once written.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub id: RecordId,
    pub user_id: String,
    pub game_type: GameType,
    pub summary: SessionSummary,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreQuery {
    pub user_id: String,
    pub game_type: Option<GameType>,
}

impl ScoreQuery {
    pub fn new(user_id: impl Into<String>, game_type: Option<GameType>) -> Self {
        Self {
            user_id: user_id.into(),
            game_type,
        }
    }
}

pub trait ScoreStore {
    /// Stores a finished session; the store assigns the timestamp
    fn append(&self, user_id: &str, summary: &SessionSummary) -> Result<RecordId>;

    /// Up to `limit` records matching `query`. Callers must not rely on the order.
    fn query(&self, query: &ScoreQuery, limit: usize) -> Result<Vec<ScoreRecord>>;

    /// Top ten sessions of one game: fastest reaction times, highest aim scores
    fn best_scores(&self, user_id: &str, game_type: GameType) -> Result<Vec<ScoreRecord>> {
        let records = self.query(&ScoreQuery::new(user_id, Some(game_type)), usize::MAX)?;
        let ranked = match game_type {
            GameType::ReactionTime => records
                .into_iter()
                .sorted_by(|a, b| {
                    let a = a.summary.metric(game_type).unwrap_or(f64::INFINITY);
                    let b = b.summary.metric(game_type).unwrap_or(f64::INFINITY);
                    a.total_cmp(&b)
                })
                .collect::<Vec<_>>(),
            GameType::CircleTarget => records
                .into_iter()
                .sorted_by(|a, b| {
                    let a = a.summary.metric(game_type).unwrap_or(0.0);
                    let b = b.summary.metric(game_type).unwrap_or(0.0);
                    b.total_cmp(&a)
                })
                .collect::<Vec<_>>(),
        };
        Ok(ranked.into_iter().take(BEST_SCORES_LIMIT).collect())
    }
}

/// Score history in a local SQLite file
#[derive(Debug)]
pub struct SqliteScoreStore {
    conn: Connection,
}

impl SqliteScoreStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        let store = Self::with_connection(conn)?;
        info!("opened score database at {:?}", db_path);
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS scores (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                game_type TEXT NOT NULL,
                payload TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_scores_user_game ON scores(user_id, game_type)",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_scores_timestamp ON scores(timestamp)",
            [],
        )?;

        Ok(Self { conn })
    }

    pub fn append_at(
        &self,
        user_id: &str,
        summary: &SessionSummary,
        timestamp: DateTime<Utc>,
    ) -> Result<RecordId> {
        let payload = serde_json::to_string(summary)?;
        self.conn.execute(
            "INSERT INTO scores (user_id, game_type, payload, timestamp) VALUES (?1, ?2, ?3, ?4)",
            params![
                user_id,
                summary.game_type().to_string(),
                payload,
                timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}

impl ScoreStore for SqliteScoreStore {
    fn append(&self, user_id: &str, summary: &SessionSummary) -> Result<RecordId> {
        self.append_at(user_id, summary, Utc::now())
    }

    fn query(&self, query: &ScoreQuery, limit: usize) -> Result<Vec<ScoreRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let game_type = query.game_type.map(|g| g.to_string());

        // newest first, so the limit always keeps the most recent sessions
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, user_id, payload, timestamp
            FROM scores
            WHERE user_id = ?1 AND (?2 IS NULL OR game_type = ?2)
            ORDER BY timestamp DESC, id DESC
            LIMIT ?3
            "#,
        )?;

        let rows = stmt.query_map(params![query.user_id, game_type, limit], |row| {
            Ok((
                row.get::<_, RecordId>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, user_id, payload, timestamp) = row?;
            let summary: SessionSummary = serde_json::from_str(&payload)?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp)
                .map_err(|_| AppError::Timestamp(timestamp.clone()))?
                .with_timezone(&Utc);
            records.push(ScoreRecord {
                id,
                user_id,
                game_type: summary.game_type(),
                summary,
                timestamp,
            });
        }

        Ok(records)
    }
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    date: String,
    game_type: String,
    score: Option<u32>,
    accuracy: Option<String>,
    total_shots: Option<u32>,
    missed_shots: Option<u32>,
    reaction_time_ms: Option<u64>,
    new_record: Option<bool>,
    user_id: &'a str,
}

/// Writes records as CSV, one row per session
pub fn write_csv<W: Write>(records: &[ScoreRecord], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        let mut row = CsvRow {
            date: record.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            game_type: record.game_type.to_string(),
            score: None,
            accuracy: None,
            total_shots: None,
            missed_shots: None,
            reaction_time_ms: None,
            new_record: None,
            user_id: &record.user_id,
        };
        match &record.summary {
            SessionSummary::CircleTarget(s) => {
                row.score = Some(s.score);
                row.accuracy = Some(format!("{:.2}", s.accuracy));
                row.total_shots = Some(s.total_shots);
                row.missed_shots = Some(s.missed_shots);
            }
            SessionSummary::ReactionTime(s) => {
                row.reaction_time_ms = Some(s.reaction_time);
                row.new_record = Some(s.is_new_record);
            }
        }
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
