use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::ai::{DqnAgent, Participant, RandomPlayer, ScriptedPlayer, TrainOutcome, ValueEstimator};
use crate::arena::{winning_seat, Arena, Seat, SessionTally};
use crate::checkpoint::{CheckpointManager, CheckpointMetrics};
use crate::error::TrainingError;
use crate::game::{Board, Cell, ConnectFour};
use crate::training::metrics::{EpisodeResult, TrainingMetrics};

/// Column preferences of the scripted opponent: centre first.
pub const CENTER_FIRST: [usize; 7] = [3, 2, 4, 1, 5, 0, 6];

/// Who the agent trains against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OpponentKind {
    Random,
    Scripted,
}

/// Trainer configuration.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub num_games: usize,
    /// Games between target estimator syncs.
    pub target_sync_interval: usize,
    pub log_interval: usize,
    pub eval_interval: usize,
    pub eval_games: usize,
    pub checkpoint_interval: usize,
    pub opponent: OpponentKind,
    /// Seeds opponents and evaluation; drawn from the OS when absent.
    pub seed: Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            num_games: 1000,
            target_sync_interval: 10,
            log_interval: 100,
            eval_interval: 500,
            eval_games: 50,
            checkpoint_interval: 1000,
            opponent: OpponentKind::Random,
            seed: None,
        }
    }
}

/// What a training run ended with.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    /// Lifetime games, including those before a resume.
    pub games_played: usize,
    pub train_steps: usize,
    pub epsilon: f32,
    pub final_eval: SessionTally,
}

/// Trains a DQN agent against a fixed opponent, one game per update.
pub struct Trainer {
    config: TrainerConfig,
    checkpoints: Option<CheckpointManager>,
    rng: StdRng,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Trainer {
            config,
            checkpoints: None,
            rng,
        }
    }

    /// Save checkpoints through `manager` during and after training.
    pub fn with_checkpoints(mut self, manager: CheckpointManager) -> Self {
        self.checkpoints = Some(manager);
        self
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    fn opponent(&mut self) -> Box<dyn Participant<ConnectFour>> {
        match self.config.opponent {
            OpponentKind::Random => Box::new(RandomPlayer::with_rng(StdRng::seed_from_u64(
                self.rng.random(),
            ))),
            OpponentKind::Scripted => Box::new(ScriptedPlayer::new(CENTER_FIRST.to_vec())),
        }
    }

    /// Run `num_games` training games. `games_before` offsets checkpoint
    /// numbering when resuming.
    pub fn train<E>(
        &mut self,
        agent: &mut DqnAgent<Board, E>,
        games_before: usize,
    ) -> Result<TrainingSummary, TrainingError>
    where
        E: ValueEstimator<Board>,
    {
        let num_games = self.config.num_games;
        let mut metrics = TrainingMetrics::with_capacity(self.config.log_interval.max(1));
        let mut last_eval_rate = 0.0;
        let mut saved_at = None;

        info!(
            num_games,
            games_before,
            opponent = ?self.config.opponent,
            epsilon = agent.epsilon(),
            "starting DQN training"
        );

        let opponent = self.opponent();
        let mut arena = Arena::new(ConnectFour::new(), &mut *agent, opponent);

        for game_index in 1..=num_games {
            let games_played = games_before + game_index;
            let starting = if game_index % 2 == 1 {
                Seat::First
            } else {
                Seat::Second
            };

            let result = arena.play_game(starting)?;
            let board = arena.game().state().board();
            metrics.record_episode(EpisodeResult {
                winner: winning_seat(starting, result),
                game_length: board.count(Cell::Red) + board.count(Cell::Yellow),
            });

            match arena.first_mut().train()? {
                TrainOutcome::Trained { loss } => metrics.record_update(loss),
                TrainOutcome::Skipped => metrics.record_skipped_update(),
            }

            if every(game_index, self.config.target_sync_interval) {
                arena.first_mut().sync_target();
                debug!(games_played, "target estimator synced");
            }

            if every(game_index, self.config.log_interval) {
                let window = self.config.log_interval;
                info!(
                    games_played,
                    epsilon = arena.first().epsilon(),
                    loss = metrics.average_loss(window),
                    win_rate = metrics.win_rate(Seat::First, window),
                    draw_rate = metrics.draw_rate(window),
                    avg_len = metrics.average_game_length(window),
                    replay = arena.first().replay_len(),
                    "training progress"
                );
            }

            if every(game_index, self.config.eval_interval) {
                let tally = self.evaluate(&**arena.first())?;
                last_eval_rate = win_rate(&tally);
                info!(games_played, eval_games = tally.total(), win_rate = last_eval_rate, "eval vs random");
            }

            if every(game_index, self.config.checkpoint_interval) {
                self.save(&**arena.first(), &metrics, last_eval_rate, games_played)?;
                saved_at = Some(game_index);
            }
        }

        let final_eval = self.evaluate(&**arena.first())?;
        let final_rate = win_rate(&final_eval);
        if num_games > 0 && saved_at != Some(num_games) {
            self.save(&**arena.first(), &metrics, final_rate, games_before + num_games)?;
        }
        drop(arena);

        info!(
            games = metrics.total_episodes(),
            skipped_updates = metrics.skipped_updates(),
            final_win_rate = final_rate,
            "training complete"
        );

        Ok(TrainingSummary {
            games_played: games_before + num_games,
            train_steps: agent.train_steps(),
            epsilon: agent.epsilon(),
            final_eval,
        })
    }

    /// Greedy play against a random opponent. Neither epsilon nor the replay
    /// buffer is touched.
    pub fn evaluate<E>(&mut self, agent: &DqnAgent<Board, E>) -> Result<SessionTally, TrainingError>
    where
        E: ValueEstimator<Board>,
    {
        let random = RandomPlayer::with_rng(StdRng::seed_from_u64(self.rng.random()));
        let mut arena = Arena::new(ConnectFour::new(), agent.greedy(), random);
        Ok(arena.play_session(self.config.eval_games)?)
    }

    fn save<E>(
        &self,
        agent: &DqnAgent<Board, E>,
        metrics: &TrainingMetrics,
        eval_win_rate: f32,
        games_played: usize,
    ) -> Result<(), TrainingError>
    where
        E: ValueEstimator<Board>,
    {
        let Some(manager) = &self.checkpoints else {
            return Ok(());
        };
        let window = self.config.log_interval;
        let snapshot = CheckpointMetrics {
            eval_win_rate,
            draw_rate: metrics.draw_rate(window),
            average_game_length: metrics.average_game_length(window),
            average_loss: metrics.average_loss(window),
        };
        manager.save_checkpoint(agent, &snapshot, games_played)?;
        Ok(())
    }
}

/// Whether `n` falls on `interval`; a zero interval never fires.
fn every(n: usize, interval: usize) -> bool {
    interval != 0 && n % interval == 0
}

/// First-seat win fraction of a session, 0 when empty.
pub fn win_rate(tally: &SessionTally) -> f32 {
    match tally.total() {
        0 => 0.0,
        n => tally.first_wins as f32 / n as f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{ConnectFourAgent, DqnConfig};
    use crate::checkpoint::CheckpointManagerConfig;

    fn small_agent() -> ConnectFourAgent {
        ConnectFourAgent::with_network(
            DqnConfig {
                hidden_size: 8,
                batch_size: 8,
                replay_capacity: 200,
                epsilon_decay: 0.9,
                ..Default::default()
            },
            StdRng::seed_from_u64(7),
        )
    }

    fn small_config(num_games: usize) -> TrainerConfig {
        TrainerConfig {
            num_games,
            target_sync_interval: 2,
            log_interval: 2,
            eval_interval: 3,
            eval_games: 4,
            checkpoint_interval: 3,
            opponent: OpponentKind::Random,
            seed: Some(11),
        }
    }

    #[test]
    fn test_training_updates_agent_and_saves_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(CheckpointManagerConfig {
            checkpoint_dir: dir.path().to_path_buf(),
            keep_last_n: 10,
            keep_best_n: 0,
        })
        .unwrap();
        let mut agent = small_agent();
        let mut trainer = Trainer::new(small_config(6)).with_checkpoints(manager);

        let summary = trainer.train(&mut agent, 0).unwrap();
        assert_eq!(summary.games_played, 6);
        assert_eq!(summary.final_eval.total(), 4);
        assert!(summary.train_steps >= 1);
        assert!(summary.epsilon < 1.0);
        assert!(!agent.has_pending());
        assert!(agent.replay_len() >= 6 * 3);

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"checkpoint_0000003".to_string()));
        assert!(names.contains(&"checkpoint_0000006".to_string()));
    }

    #[test]
    fn test_resume_offsets_checkpoint_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(CheckpointManagerConfig {
            checkpoint_dir: dir.path().to_path_buf(),
            keep_last_n: 10,
            keep_best_n: 0,
        })
        .unwrap();
        let mut agent = small_agent();
        let config = TrainerConfig {
            opponent: OpponentKind::Scripted,
            checkpoint_interval: 100,
            ..small_config(2)
        };
        let mut trainer = Trainer::new(config).with_checkpoints(manager);

        let summary = trainer.train(&mut agent, 40).unwrap();
        assert_eq!(summary.games_played, 42);
        assert!(dir.path().join("checkpoint_0000042").is_dir());
    }

    #[test]
    fn test_evaluation_leaves_agent_untouched() {
        let agent = small_agent();
        let mut trainer = Trainer::new(small_config(1));
        let tally = trainer.evaluate(&agent).unwrap();
        assert_eq!(tally.total(), 4);
        assert_eq!(tally.first_as_red, 2);
        assert_eq!(agent.replay_len(), 0);
        assert_eq!(agent.epsilon(), 1.0);
    }

    #[test]
    fn test_win_rate_of_empty_session() {
        assert_eq!(win_rate(&SessionTally::default()), 0.0);
        let tally = SessionTally {
            first_wins: 3,
            second_wins: 1,
            ..Default::default()
        };
        assert_eq!(win_rate(&tally), 0.75);
    }
}
