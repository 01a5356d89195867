//! Training infrastructure: the trainer loop, replay buffer, and rolling
//! metrics.

pub mod metrics;
pub mod replay_buffer;
pub mod trainer;

pub use trainer::{OpponentKind, Trainer, TrainerConfig, TrainingSummary};
