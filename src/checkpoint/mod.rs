//! On-disk snapshots of a training run: online weights plus JSON metadata.

mod manager;
mod metadata;

pub use manager::{CheckpointData, CheckpointManager, CheckpointManagerConfig};
pub use metadata::{CheckpointMetadata, CheckpointMetrics};
