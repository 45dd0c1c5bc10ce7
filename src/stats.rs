//! Descriptive statistics over a player's recent sessions.
//!
//! Everything is recomputed from the capped history on each call; nothing is
//! kept between calls.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::score_store::{ScoreQuery, ScoreRecord, ScoreStore, HISTORY_LIMIT};
use crate::session::GameType;
use crate::util::mean;

/// Sessions per comparison window for the improvement figure
pub const TREND_WINDOW: usize = 10;
/// Sessions shown on the progress chart
pub const CHART_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    /// 1-based position, oldest first
    pub game: usize,
    pub value: f64,
    pub accuracy: Option<f64>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameStats {
    pub total_games: usize,
    pub average_score: Option<f64>,
    pub best_score: Option<f64>,
    /// Percent change of the last ten sessions against the ten before;
    /// positive always means the player got better
    pub improvement: f64,
    pub chart_data: Vec<ChartPoint>,
}

impl GameStats {
    pub fn empty() -> Self {
        Self {
            total_games: 0,
            average_score: None,
            best_score: None,
            improvement: 0.0,
            chart_data: Vec::new(),
        }
    }
}

pub fn compute_game_stats(game_type: GameType, mut records: Vec<ScoreRecord>) -> GameStats {
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    records.truncate(HISTORY_LIMIT);

    if records.is_empty() {
        return GameStats::empty();
    }

    let metrics: Vec<f64> = records
        .iter()
        .filter_map(|r| r.summary.metric(game_type))
        .collect();

    let best_score = match game_type {
        GameType::ReactionTime => metrics.iter().copied().reduce(f64::min),
        GameType::CircleTarget => metrics.iter().copied().reduce(f64::max),
    };

    GameStats {
        total_games: records.len(),
        average_score: mean(&metrics),
        best_score,
        improvement: improvement(game_type, &records),
        chart_data: chart_data(game_type, &records),
    }
}

/// `records` must be newest first
fn improvement(game_type: GameType, records: &[ScoreRecord]) -> f64 {
    if records.len() < TREND_WINDOW {
        return 0.0;
    }

    let window_mean = |window: &[ScoreRecord]| {
        let values: Vec<f64> = window
            .iter()
            .map(|r| r.summary.metric(game_type).unwrap_or(0.0))
            .collect();
        mean(&values)
    };

    let recent_end = TREND_WINDOW;
    let previous_end = records.len().min(TREND_WINDOW * 2);

    let Some(recent) = window_mean(&records[..recent_end]) else {
        return 0.0;
    };
    let previous = window_mean(&records[recent_end..previous_end]).unwrap_or(recent);

    if previous == 0.0 {
        return 0.0;
    }

    match game_type {
        GameType::ReactionTime => (previous - recent) / previous * 100.0,
        GameType::CircleTarget => (recent - previous) / previous * 100.0,
    }
}

/// `records` must be newest first
fn chart_data(game_type: GameType, records: &[ScoreRecord]) -> Vec<ChartPoint> {
    records
        .iter()
        .take(CHART_LIMIT)
        .rev()
        .enumerate()
        .map(|(idx, r)| ChartPoint {
            game: idx + 1,
            value: r.summary.metric(game_type).unwrap_or(0.0),
            accuracy: match game_type {
                GameType::CircleTarget => Some(r.summary.accuracy().unwrap_or(0.0)),
                GameType::ReactionTime => None,
            },
            date: r.timestamp,
        })
        .collect()
}

/// Loads the last hundred sessions of one game and aggregates them
pub fn get_game_stats<S: ScoreStore + ?Sized>(
    store: &S,
    user_id: &str,
    game_type: GameType,
) -> Result<GameStats> {
    let records = store.query(&ScoreQuery::new(user_id, Some(game_type)), HISTORY_LIMIT)?;
    tracing::debug!(
        "aggregating {} {} sessions for {}",
        records.len(),
        game_type,
        user_id
    );
    Ok(compute_game_stats(game_type, records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{AimSummary, ReactionSummary, SessionSummary};
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn reaction_history(oldest_first: &[u64]) -> Vec<ScoreRecord> {
        oldest_first
            .iter()
            .enumerate()
            .map(|(i, ms)| ScoreRecord {
                id: i as i64 + 1,
                user_id: "u1".into(),
                game_type: GameType::ReactionTime,
                summary: SessionSummary::ReactionTime(ReactionSummary {
                    reaction_time: *ms,
                    is_new_record: false,
                }),
                timestamp: at(i as i64),
            })
            .collect()
    }

    fn aim_history(oldest_first: &[u32]) -> Vec<ScoreRecord> {
        oldest_first
            .iter()
            .enumerate()
            .map(|(i, score)| ScoreRecord {
                id: i as i64 + 1,
                user_id: "u1".into(),
                game_type: GameType::CircleTarget,
                summary: SessionSummary::CircleTarget(AimSummary::new(*score, score * 2, *score)),
                timestamp: at(i as i64),
            })
            .collect()
    }

    #[test]
    fn empty_history() {
        for game in GameType::ALL {
            let stats = compute_game_stats(game, vec![]);
            assert_eq!(stats, GameStats::empty());
            assert_eq!(stats.best_score, None);
            assert_eq!(stats.average_score, None);
        }
    }

    #[test]
    fn short_history_has_no_improvement() {
        let stats = compute_game_stats(
            GameType::ReactionTime,
            reaction_history(&[400, 300, 200, 100, 90, 80, 70, 60, 50]),
        );
        assert_eq!(stats.improvement, 0.0);

        let stats =
            compute_game_stats(GameType::CircleTarget, aim_history(&[1, 2, 3, 4, 5, 6, 7, 8, 9]));
        assert_eq!(stats.improvement, 0.0);
    }

    #[test]
    fn best_and_average_follow_game_direction() {
        let stats =
            compute_game_stats(GameType::ReactionTime, reaction_history(&[250, 180, 320, 210]));
        assert_eq!(stats.best_score, Some(180.0));
        assert_eq!(stats.average_score, Some(240.0));
        assert_eq!(stats.total_games, 4);

        let stats = compute_game_stats(GameType::CircleTarget, aim_history(&[12, 40, 33, 15]));
        assert_eq!(stats.best_score, Some(40.0));
        assert_eq!(stats.average_score, Some(25.0));
    }

    #[test]
    fn faster_recent_reactions_are_positive_improvement() {
        let history = reaction_history(&[300, 300, 300, 300, 300, 300, 300, 300, 300, 300, 100, 100]);
        let stats = compute_game_stats(GameType::ReactionTime, history);
        // recent ten: 100, 100, then eight 300s -> 260; previous two: 300
        let expected = (300.0 - 260.0) / 300.0 * 100.0;
        assert!((stats.improvement - expected).abs() < 1e-9);
        assert!(stats.improvement > 0.0);
    }

    #[test]
    fn higher_recent_scores_are_positive_improvement() {
        let mut scores = vec![10; 10];
        scores.extend(vec![20; 10]);
        let stats = compute_game_stats(GameType::CircleTarget, aim_history(&scores));
        assert!((stats.improvement - 100.0).abs() < 1e-9);

        let mut scores = vec![20; 10];
        scores.extend(vec![10; 10]);
        let stats = compute_game_stats(GameType::CircleTarget, aim_history(&scores));
        assert!((stats.improvement + 50.0).abs() < 1e-9);
    }

    #[test]
    fn exactly_ten_sessions_compare_against_themselves() {
        let stats = compute_game_stats(
            GameType::ReactionTime,
            reaction_history(&[100, 200, 300, 400, 500, 100, 200, 300, 400, 500]),
        );
        assert_eq!(stats.improvement, 0.0);
    }

    #[test]
    fn zero_previous_mean_does_not_divide() {
        let mut scores = vec![0; 10];
        scores.extend(vec![5; 10]);
        let stats = compute_game_stats(GameType::CircleTarget, aim_history(&scores));
        assert_eq!(stats.improvement, 0.0);
    }

    #[test]
    fn improvement_ignores_sessions_beyond_twenty() {
        // oldest five are far slower and must not affect the previous window
        let mut times = vec![900; 5];
        times.extend(vec![200; 10]);
        times.extend(vec![100; 10]);
        let stats = compute_game_stats(GameType::ReactionTime, reaction_history(&times));
        assert!((stats.improvement - 50.0).abs() < 1e-9);
    }

    #[test]
    fn chart_is_oldest_first_and_capped() {
        let times: Vec<u64> = (1..=25).map(|i| i * 10).collect();
        let mut history = reaction_history(&times);
        history.reverse();
        history.swap(3, 17);

        let stats = compute_game_stats(GameType::ReactionTime, history);
        assert_eq!(stats.chart_data.len(), 20);
        assert_eq!(stats.chart_data[0].game, 1);
        assert_eq!(stats.chart_data[0].value, 60.0);
        assert_eq!(stats.chart_data[19].game, 20);
        assert_eq!(stats.chart_data[19].value, 250.0);
        assert!(stats
            .chart_data
            .windows(2)
            .all(|w| w[0].date < w[1].date));
        assert!(stats.chart_data.iter().all(|p| p.accuracy.is_none()));
    }

    #[test]
    fn aim_chart_carries_accuracy() {
        let stats = compute_game_stats(GameType::CircleTarget, aim_history(&[10, 20]));
        assert_eq!(stats.chart_data[0].accuracy, Some(50.0));
        assert_eq!(stats.chart_data[1].value, 20.0);
    }

    #[test]
    fn history_is_capped_at_one_hundred() {
        let times: Vec<u64> = (0..130).map(|i| 100 + i).collect();
        let stats = compute_game_stats(GameType::ReactionTime, reaction_history(&times));
        assert_eq!(stats.total_games, 100);
        // the thirty oldest (and fastest) sessions fall outside the window
        assert_eq!(stats.best_score, Some(130.0));
    }

    #[test]
    fn foreign_records_are_left_out_of_average() {
        let mut history = reaction_history(&[200, 400]);
        history.extend(aim_history(&[50]).into_iter().map(|mut r| {
            r.timestamp = at(99);
            r
        }));
        let stats = compute_game_stats(GameType::ReactionTime, history);
        assert_eq!(stats.total_games, 3);
        assert_eq!(stats.average_score, Some(300.0));
        assert_eq!(stats.best_score, Some(200.0));
    }

    #[test]
    fn reads_through_the_store() {
        let store = crate::score_store::SqliteScoreStore::open_in_memory().unwrap();
        for (i, ms) in [300u64, 250, 200].iter().enumerate() {
            store
                .append_at(
                    "u1",
                    &SessionSummary::ReactionTime(ReactionSummary {
                        reaction_time: *ms,
                        is_new_record: false,
                    }),
                    at(i as i64),
                )
                .unwrap();
        }
        let stats = get_game_stats(&store, "u1", GameType::ReactionTime).unwrap();
        assert_eq!(stats.total_games, 3);
        assert_eq!(stats.best_score, Some(200.0));
        assert_eq!(stats.chart_data.last().map(|p| p.value), Some(200.0));
    }
}
