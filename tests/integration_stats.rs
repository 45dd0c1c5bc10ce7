use chrono::{Duration, TimeZone, Utc};

use aimdrill::score_store::{ScoreStore, SqliteScoreStore};
use aimdrill::session::{AimSummary, GameType, ReactionSummary, SessionSummary};
use aimdrill::stats::get_game_stats;

fn reaction(ms: u64) -> SessionSummary {
    SessionSummary::ReactionTime(ReactionSummary {
        reaction_time: ms,
        is_new_record: false,
    })
}

#[test]
fn twelve_sessions_on_disk_show_positive_improvement() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteScoreStore::open(&dir.path().join("scores.db")).unwrap();
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

    // two slow sessions first, then ten faster ones
    let history = [300, 300, 260, 260, 260, 260, 260, 260, 260, 260, 260, 260];
    for (i, ms) in history.iter().enumerate() {
        store
            .append_at("u1", &reaction(*ms), start + Duration::minutes(i as i64))
            .unwrap();
    }

    let stats = get_game_stats(&store, "u1", GameType::ReactionTime).unwrap();
    assert_eq!(stats.total_games, 12);
    assert_eq!(stats.best_score, Some(260.0));
    assert!((stats.improvement - 13.333).abs() < 0.01, "{}", stats.improvement);

    // chart runs oldest to newest
    assert_eq!(stats.chart_data.len(), 12);
    assert_eq!(stats.chart_data[0].value, 300.0);
    assert_eq!(stats.chart_data[0].game, 1);
    assert_eq!(stats.chart_data[11].game, 12);
}

#[test]
fn games_and_users_do_not_mix() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteScoreStore::open(&dir.path().join("scores.db")).unwrap();

    store.append("u1", &reaction(200)).unwrap();
    store
        .append(
            "u1",
            &SessionSummary::CircleTarget(AimSummary::new(45, 60, 15)),
        )
        .unwrap();
    store.append("u2", &reaction(150)).unwrap();

    let reaction_stats = get_game_stats(&store, "u1", GameType::ReactionTime).unwrap();
    assert_eq!(reaction_stats.total_games, 1);
    assert_eq!(reaction_stats.best_score, Some(200.0));

    let aim_stats = get_game_stats(&store, "u1", GameType::CircleTarget).unwrap();
    assert_eq!(aim_stats.total_games, 1);
    assert_eq!(aim_stats.chart_data[0].accuracy, Some(75.0));

    let best = store.best_scores("u2", GameType::ReactionTime).unwrap();
    assert_eq!(best.len(), 1);
}

#[test]
fn history_survives_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scores.db");
    {
        let store = SqliteScoreStore::open(&path).unwrap();
        store.append("u1", &reaction(180)).unwrap();
    }

    let store = SqliteScoreStore::open(&path).unwrap();
    let stats = get_game_stats(&store, "u1", GameType::ReactionTime).unwrap();
    assert_eq!(stats.total_games, 1);
    assert_eq!(stats.average_score, Some(180.0));
}
