use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use crate::ai::{DqnAgent, ValueEstimator};
use crate::checkpoint::metadata::{CheckpointMetadata, CheckpointMetrics};
use crate::error::CheckpointError;

const METADATA_FILE: &str = "metadata.json";
const WEIGHTS_STEM: &str = "online";

/// Configuration for the checkpoint manager.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CheckpointManagerConfig {
    pub checkpoint_dir: PathBuf,
    pub keep_last_n: usize,
    /// Also keep this many checkpoints with the best evaluation win rate.
    pub keep_best_n: usize,
}

impl Default for CheckpointManagerConfig {
    fn default() -> Self {
        CheckpointManagerConfig {
            checkpoint_dir: PathBuf::from("checkpoints"),
            keep_last_n: 5,
            keep_best_n: 1,
        }
    }
}

/// A checkpoint found on disk.
#[derive(Debug, Clone)]
pub struct CheckpointData {
    pub path: PathBuf,
    pub metadata: CheckpointMetadata,
}

impl CheckpointData {
    /// Path handed to the estimator for its weights (the recorder adds the extension).
    pub fn weights_path(&self) -> PathBuf {
        self.path.join(WEIGHTS_STEM)
    }
}

/// Manages saving, loading, listing, and pruning checkpoints.
pub struct CheckpointManager {
    config: CheckpointManagerConfig,
}

impl CheckpointManager {
    pub fn new(config: CheckpointManagerConfig) -> Result<Self, CheckpointError> {
        fs::create_dir_all(&config.checkpoint_dir)?;
        Ok(CheckpointManager { config })
    }

    pub fn config(&self) -> &CheckpointManagerConfig {
        &self.config
    }

    /// Write `checkpoint_{games_played:07}`, replacing any existing one with
    /// that number, then prune.
    pub fn save_checkpoint<S, E>(
        &self,
        agent: &DqnAgent<S, E>,
        metrics: &CheckpointMetrics,
        games_played: usize,
    ) -> Result<PathBuf, CheckpointError>
    where
        S: Clone,
        E: ValueEstimator<S>,
    {
        let dir_name = format!("checkpoint_{games_played:07}");
        let tmp_dir = self.config.checkpoint_dir.join(format!("{dir_name}.tmp"));
        let final_dir = self.config.checkpoint_dir.join(&dir_name);

        if tmp_dir.exists() {
            fs::remove_dir_all(&tmp_dir)?;
        }
        fs::create_dir_all(&tmp_dir)?;

        agent.save(&tmp_dir.join(WEIGHTS_STEM))?;

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let metadata = CheckpointMetadata {
            games_played,
            timestamp,
            epsilon: agent.epsilon(),
            train_steps: agent.train_steps(),
            metrics: metrics.clone(),
            hyperparameters: agent.config().clone(),
        };
        fs::write(
            tmp_dir.join(METADATA_FILE),
            serde_json::to_string_pretty(&metadata)?,
        )?;

        // Atomic rename
        if final_dir.exists() {
            fs::remove_dir_all(&final_dir)?;
        }
        fs::rename(&tmp_dir, &final_dir)?;
        info!(path = %final_dir.display(), games_played, "checkpoint saved");

        self.prune_old_checkpoints()?;
        Ok(final_dir)
    }

    /// Read the metadata of the checkpoint in `dir`.
    pub fn load_checkpoint(&self, dir: &Path) -> Result<CheckpointData, CheckpointError> {
        let metadata = read_metadata(&dir.join(METADATA_FILE))?;
        Ok(CheckpointData {
            path: dir.to_path_buf(),
            metadata,
        })
    }

    /// The checkpoint with the most games played.
    pub fn latest(&self) -> Result<CheckpointData, CheckpointError> {
        self.list_checkpoints()?
            .pop()
            .ok_or_else(|| CheckpointError::NoCheckpoints(self.config.checkpoint_dir.clone()))
    }

    /// Load weights and exploration state from `data` into `agent`. The target
    /// estimator is synced to the restored weights.
    pub fn restore<S, E>(
        &self,
        data: &CheckpointData,
        agent: &mut DqnAgent<S, E>,
    ) -> Result<(), CheckpointError>
    where
        S: Clone,
        E: ValueEstimator<S>,
    {
        agent.load(&data.weights_path())?;
        agent.sync_target();
        agent.set_epsilon(data.metadata.epsilon);
        info!(
            path = %data.path.display(),
            games_played = data.metadata.games_played,
            epsilon = data.metadata.epsilon,
            "checkpoint restored"
        );
        Ok(())
    }

    /// List all checkpoints sorted by games played (ascending). Unfinished
    /// `.tmp` directories are ignored.
    pub fn list_checkpoints(&self) -> Result<Vec<CheckpointData>, CheckpointError> {
        let mut results = Vec::new();
        for entry in fs::read_dir(&self.config.checkpoint_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.starts_with("checkpoint_") || name.ends_with(".tmp") {
                continue;
            }
            if path.join(METADATA_FILE).exists() {
                results.push(self.load_checkpoint(&path)?);
            }
        }
        results.sort_by_key(|c| c.metadata.games_played);
        Ok(results)
    }

    /// Keep the union of the last N and the best N by evaluation win rate.
    fn prune_old_checkpoints(&self) -> Result<(), CheckpointError> {
        let checkpoints = self.list_checkpoints()?;
        let total = checkpoints.len();
        if total <= self.config.keep_last_n {
            return Ok(());
        }

        let mut keep: HashSet<usize> = (total.saturating_sub(self.config.keep_last_n)..total).collect();

        let mut by_win_rate: Vec<(usize, f32)> = checkpoints
            .iter()
            .enumerate()
            .map(|(i, c)| (i, c.metadata.metrics.eval_win_rate))
            .collect();
        by_win_rate.sort_by(|a, b| b.1.total_cmp(&a.1));
        keep.extend(by_win_rate.iter().take(self.config.keep_best_n).map(|(i, _)| *i));

        for (i, checkpoint) in checkpoints.iter().enumerate() {
            if !keep.contains(&i) {
                debug!(path = %checkpoint.path.display(), "pruning checkpoint");
                fs::remove_dir_all(&checkpoint.path)?;
            }
        }
        Ok(())
    }
}

fn read_metadata(path: &Path) -> Result<CheckpointMetadata, CheckpointError> {
    let json = fs::read_to_string(path).map_err(|e| CheckpointError::MetadataRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&json).map_err(|e| CheckpointError::MetadataParse {
        path: path.to_path_buf(),
        source: e,
    })
}
