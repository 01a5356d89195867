use std::path::Path;

use tracing::warn;

use crate::ai::DqnConfig;
use crate::checkpoint::CheckpointManagerConfig;
use crate::error::ConfigError;
use crate::training::TrainerConfig;

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub agent: DqnConfig,
    pub training: TrainerConfig,
    pub checkpoint: CheckpointManagerConfig,
}

fn invalid(message: &str) -> Result<(), ConfigError> {
    Err(ConfigError::Validation(message.into()))
}

fn unit_interval(value: f32) -> bool {
    (0.0..=1.0).contains(&value)
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let agent = &self.agent;
        if agent.learning_rate <= 0.0 {
            return invalid("agent.learning_rate must be > 0");
        }
        if !unit_interval(agent.gamma) {
            return invalid("agent.gamma must be in [0, 1]");
        }
        if !unit_interval(agent.epsilon_start) {
            return invalid("agent.epsilon_start must be in [0, 1]");
        }
        if !unit_interval(agent.epsilon_min) {
            return invalid("agent.epsilon_min must be in [0, 1]");
        }
        if agent.epsilon_min > agent.epsilon_start {
            return invalid("agent.epsilon_min must be <= agent.epsilon_start");
        }
        if agent.epsilon_decay <= 0.0 || agent.epsilon_decay > 1.0 {
            return invalid("agent.epsilon_decay must be in (0, 1]");
        }
        if agent.batch_size == 0 {
            return invalid("agent.batch_size must be > 0");
        }
        if agent.replay_capacity < agent.batch_size {
            return invalid("agent.replay_capacity must be >= agent.batch_size");
        }
        if agent.hidden_size == 0 {
            return invalid("agent.hidden_size must be > 0");
        }

        let training = &self.training;
        for (value, name) in [
            (training.num_games, "training.num_games"),
            (training.target_sync_interval, "training.target_sync_interval"),
            (training.log_interval, "training.log_interval"),
            (training.eval_interval, "training.eval_interval"),
            (training.checkpoint_interval, "training.checkpoint_interval"),
        ] {
            if value == 0 {
                return Err(ConfigError::Validation(format!("{name} must be > 0")));
            }
        }

        Ok(())
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&AppConfig::default()).expect("default config serializes")
    }
}
