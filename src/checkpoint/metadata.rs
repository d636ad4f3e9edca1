use serde::{Deserialize, Serialize};

use crate::ai::QLearningConfig;

/// Metrics snapshot at checkpoint time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetrics {
    pub win_rate: f32,
    pub loss_rate: f32,
    pub draw_rate: f32,
    pub average_game_length: f32,
    pub average_reward: f32,
    pub table_states: usize,
}

/// Top-level checkpoint metadata written to metadata.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub game: usize,
    pub timestamp: u64,
    pub algorithm: String,
    pub metrics: CheckpointMetrics,
    pub hyperparameters: QLearningConfig,
}
