use std::path::PathBuf;

use crate::arena::Seat;

/// Errors raised by a [`Game`](crate::game::Game) when asked to move.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("illegal action {action} (legal: {legal:?})")]
    IllegalAction { action: usize, legal: Vec<usize> },

    #[error("game is over; reset before playing again")]
    GameOver,
}

/// Errors raised by the replay buffer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    #[error("requested {requested} transitions but only {available} are stored")]
    InsufficientData { requested: usize, available: usize },
}

/// Errors raised at the value-estimator boundary.
#[derive(Debug, thiserror::Error)]
pub enum EstimatorError {
    #[error("expected {expected} values per row, got {actual}")]
    Shape { expected: usize, actual: usize },

    #[error("batch has {states} states but {targets} target rows")]
    BatchMismatch { states: usize, targets: usize },

    #[error("tensor data error: {0}")]
    Tensor(String),

    #[error("failed to record parameters at {path}: {message}")]
    Record { path: PathBuf, message: String },
}

/// Errors raised by a participant while choosing an action or learning.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("asked to act with no legal moves; check the game result first")]
    NoLegalMove,

    #[error("input closed before a legal move was entered")]
    InputClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("estimator error: {0}")]
    Estimator(#[from] EstimatorError),
}

/// Errors that abort a match.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    #[error("{participant} participant selected illegal action {action} (legal: {legal:?})")]
    IllegalAction {
        participant: Seat,
        action: usize,
        legal: Vec<usize>,
    },

    #[error("{seat} participant failed: {source}")]
    Participant { seat: Seat, source: AgentError },

    #[error("game error: {0}")]
    Game(#[from] GameError),
}

/// Errors that can occur during checkpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("no checkpoints found in {0}")]
    NoCheckpoints(PathBuf),

    #[error("failed to read metadata from {path}: {source}")]
    MetadataRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse metadata from {path}: {source}")]
    MetadataParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to save weights: {0}")]
    Weights(#[from] AgentError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur during training.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("match aborted: {0}")]
    Arena(#[from] ArenaError),

    #[error("training step failed: {0}")]
    Agent(#[from] AgentError),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
