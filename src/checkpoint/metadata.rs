use serde::{Deserialize, Serialize};

use crate::ai::DqnConfig;

/// Metrics snapshot at checkpoint time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetrics {
    /// Greedy win rate against a random opponent at the last evaluation.
    pub eval_win_rate: f32,
    pub draw_rate: f32,
    pub average_game_length: f32,
    pub average_loss: f32,
}

/// Top-level checkpoint metadata written to metadata.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub games_played: usize,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
    pub epsilon: f32,
    pub train_steps: usize,
    pub metrics: CheckpointMetrics,
    pub hyperparameters: DqnConfig,
}
