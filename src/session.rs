use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::aim::CursorPosition;
use crate::scheduler::TaskKind;

/// Persisted discriminator for the two mini-games
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
pub enum GameType {
    #[serde(rename = "circle-target")]
    #[strum(serialize = "circle-target")]
    CircleTarget,
    #[serde(rename = "reaction-time")]
    #[strum(serialize = "reaction-time")]
    ReactionTime,
}

impl GameType {
    pub const ALL: [GameType; 2] = [GameType::ReactionTime, GameType::CircleTarget];

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "circle-target" => Some(GameType::CircleTarget),
            "reaction-time" => Some(GameType::ReactionTime),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            GameType::CircleTarget => "Circle Target",
            GameType::ReactionTime => "Reaction Time",
        }
    }
}

pub const AIM_GAME_SECS: u32 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AimSummary {
    pub score: u32,
    pub accuracy: f64,
    pub total_shots: u32,
    pub missed_shots: u32,
    pub game_time: u32,
}

impl AimSummary {
    pub fn new(score: u32, total_shots: u32, missed_shots: u32) -> Self {
        let accuracy = if total_shots > 0 {
            (score as f64 / total_shots as f64) * 100.0
        } else {
            0.0
        };
        Self {
            score,
            accuracy,
            total_shots,
            missed_shots,
            game_time: AIM_GAME_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionSummary {
    pub reaction_time: u64,
    pub is_new_record: bool,
}

/// What a finished session hands to the score store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "gameType")]
pub enum SessionSummary {
    #[serde(rename = "circle-target")]
    CircleTarget(AimSummary),
    #[serde(rename = "reaction-time")]
    ReactionTime(ReactionSummary),
}

impl SessionSummary {
    pub fn game_type(&self) -> GameType {
        match self {
            SessionSummary::CircleTarget(_) => GameType::CircleTarget,
            SessionSummary::ReactionTime(_) => GameType::ReactionTime,
        }
    }

    /// The value the statistics screen charts for this session
    pub fn metric(&self, game_type: GameType) -> Option<f64> {
        match (self, game_type) {
            (SessionSummary::CircleTarget(s), GameType::CircleTarget) => Some(s.score as f64),
            (SessionSummary::ReactionTime(s), GameType::ReactionTime) => {
                Some(s.reaction_time as f64)
            }
            _ => None,
        }
    }

    pub fn accuracy(&self) -> Option<f64> {
        match self {
            SessionSummary::CircleTarget(s) => Some(s.accuracy),
            SessionSummary::ReactionTime(_) => None,
        }
    }
}

/// Side effects requested by a game transition. The app executes them in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Schedule(TaskKind, Duration),
    Cancel(TaskKind),
    CancelAll,
    EngageCapture,
    ReleaseCapture,
    MoveCrosshair(CursorPosition),
    Persist(SessionSummary),
    StoreBestTime(u64),
    ExitToMenu,
}
