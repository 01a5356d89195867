use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::ai::agent::{Participant, Transition};
use crate::ai::estimator::ValueEstimator;
use crate::ai::networks::{DqnNetworkConfig, NetworkEstimator};
use crate::error::{AgentError, BufferError, EstimatorError};
use crate::game::{ActionMask, Board, Game, GameResult, Player};
use crate::training::replay_buffer::ReplayBuffer;

/// DQN hyperparameters. Fixed for the lifetime of an agent.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DqnConfig {
    /// Step size handed to the estimator's optimizer.
    pub learning_rate: f64,
    /// Discount applied to the bootstrapped next-state value.
    pub gamma: f32,
    /// Exploration rate at construction.
    pub epsilon_start: f32,
    /// Floor for epsilon.
    pub epsilon_min: f32,
    /// Multiplier applied to epsilon after each successful training step.
    pub epsilon_decay: f32,
    /// Transitions per training step; training is skipped until this many are stored.
    pub batch_size: usize,
    /// Replay buffer size; the oldest transitions are evicted beyond it.
    pub replay_capacity: usize,
    /// Bootstrap from the target estimator (true) or the online one (false).
    pub use_target_network: bool,
    /// Width of the hidden layers of the default network.
    pub hidden_size: usize,
    /// Also store the left-right mirror of every transition, when the game has one.
    pub mirror_augment: bool,
}

impl Default for DqnConfig {
    fn default() -> Self {
        DqnConfig {
            learning_rate: 1e-3,
            gamma: 0.95,
            epsilon_start: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.995,
            batch_size: 64,
            replay_capacity: 2000,
            use_target_network: true,
            hidden_size: 128,
            mirror_augment: false,
        }
    }
}

/// What a call to [`DqnAgent::train`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrainOutcome {
    /// Not enough experience yet; nothing changed.
    Skipped,
    Trained { loss: f32 },
}

/// The move awaiting its consequence.
#[derive(Debug, Clone)]
struct PendingMove<S> {
    state: S,
    action: usize,
    side: Player,
}

/// Epsilon-greedy DQN agent with experience replay and a target estimator.
///
/// Every call to `play` first closes the previous move into a transition, using
/// the board the agent now sees as its next state, then picks a new move.
/// Target synchronization is left to the caller.
pub struct DqnAgent<S, E> {
    online: E,
    target: E,
    replay_buffer: ReplayBuffer<S>,
    config: DqnConfig,
    epsilon: f32,
    pending: Option<PendingMove<S>>,
    train_steps: usize,
    rng: StdRng,
}

/// Reward for `side` given the game result.
pub fn reward_for(result: GameResult, side: Player) -> f32 {
    match result {
        GameResult::Ongoing => 0.0,
        GameResult::Winner(winner) if winner == side => 1.0,
        GameResult::Winner(_) => -1.0,
        GameResult::Draw => 0.5,
    }
}

/// Best legal action; ties go to the lowest index. NaN ranks as −∞.
fn masked_argmax(values: &[f32], mask: &ActionMask) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for action in mask.legal_actions() {
        let value = match values.get(action) {
            Some(&v) if !v.is_nan() => v,
            _ => f32::NEG_INFINITY,
        };
        if best.map_or(true, |(_, b)| value > b) {
            best = Some((action, value));
        }
    }
    best.map(|(action, _)| action)
}

/// The same experience on the left-right reflected board.
fn mirror_transition<G: Game>(transition: &Transition<G::State>) -> Option<Transition<G::State>> {
    Some(Transition {
        state: G::mirror_state(&transition.state)?,
        action: G::mirror_action(transition.action),
        reward: transition.reward,
        next_state: G::mirror_state(&transition.next_state)?,
        done: transition.done,
    })
}

impl<S: Clone, E: ValueEstimator<S>> DqnAgent<S, E> {
    /// Build an agent from two estimators of the same architecture. The target
    /// starts as a copy of the online estimator.
    pub fn new(config: DqnConfig, online: E, target: E, mut rng: StdRng) -> Self {
        let replay_buffer =
            ReplayBuffer::with_rng(config.replay_capacity, StdRng::seed_from_u64(rng.random()));
        let mut agent = DqnAgent {
            online,
            target,
            replay_buffer,
            epsilon: config.epsilon_start,
            config,
            pending: None,
            train_steps: 0,
            rng,
        };
        agent.sync_target();
        agent
    }

    /// Pick an action for the side to move and record it as pending.
    pub fn act<G: Game<State = S>>(&mut self, game: &G) -> Result<usize, AgentError> {
        let side = game.current_player();
        let state = game.canonical_form(side);

        if let Some(pending) = self.pending.take() {
            self.close::<G>(pending, game.result(), state.clone());
        }

        let mask = game.valid_moves();
        if mask.is_empty() {
            return Err(AgentError::NoLegalMove);
        }

        let action = if self.rng.random::<f32>() < self.epsilon {
            let legal = mask.legal_actions();
            legal[self.rng.random_range(0..legal.len())]
        } else {
            self.greedy_action(&state, &mask)?
        };

        self.pending = Some(PendingMove {
            state,
            action,
            side,
        });
        Ok(action)
    }

    /// Close the pending move against a finished game.
    pub fn finish_episode<G: Game<State = S>>(&mut self, game: &G) {
        if let Some(pending) = self.pending.take() {
            let next_state = game.canonical_form(pending.side);
            self.close::<G>(pending, game.result(), next_state);
        }
    }

    /// Drop the pending move without recording it, e.g. after an aborted match.
    pub fn reset_episode(&mut self) {
        self.pending = None;
    }

    fn close<G: Game<State = S>>(&mut self, pending: PendingMove<S>, result: GameResult, next_state: S) {
        let transition = Transition {
            state: pending.state,
            action: pending.action,
            reward: reward_for(result, pending.side),
            next_state,
            done: result.is_terminal(),
        };
        let mirrored = if self.config.mirror_augment {
            mirror_transition::<G>(&transition)
        } else {
            None
        };
        self.replay_buffer.push(transition);
        if let Some(mirrored) = mirrored {
            self.replay_buffer.push(mirrored);
        }
    }

    fn greedy_action(&self, state: &S, mask: &ActionMask) -> Result<usize, AgentError> {
        let values = self
            .online
            .predict(std::slice::from_ref(state))?
            .into_iter()
            .next()
            .unwrap_or_default();
        if values.len() != mask.len() {
            return Err(EstimatorError::Shape {
                expected: mask.len(),
                actual: values.len(),
            }
            .into());
        }
        masked_argmax(&values, mask).ok_or(AgentError::NoLegalMove)
    }

    /// Store a transition directly, bypassing `act`.
    pub fn remember(&mut self, transition: Transition<S>) {
        self.replay_buffer.push(transition);
    }

    /// One batched update of the online estimator from replayed experience.
    ///
    /// Skips without side effects while the buffer holds fewer than
    /// `batch_size` transitions. On success epsilon decays toward its floor.
    pub fn train(&mut self) -> Result<TrainOutcome, AgentError> {
        let batch = match self.replay_buffer.sample_batch(self.config.batch_size) {
            Ok(batch) => batch,
            Err(BufferError::InsufficientData {
                requested,
                available,
            }) => {
                debug!(requested, available, "replay buffer warming up, skipping train step");
                return Ok(TrainOutcome::Skipped);
            }
        };

        let states: Vec<S> = batch.iter().map(|t| t.state.clone()).collect();
        let next_states: Vec<S> = batch.iter().map(|t| t.next_state.clone()).collect();

        let mut targets = self.online.predict(&states)?;
        let next_values = if self.config.use_target_network {
            self.target.predict(&next_states)?
        } else {
            self.online.predict(&next_states)?
        };

        let expected = self.online.action_count();
        for ((row, transition), next) in targets.iter_mut().zip(&batch).zip(&next_values) {
            if let Some(actual) = [row.len(), next.len()].into_iter().find(|&n| n != expected) {
                return Err(EstimatorError::Shape { expected, actual }.into());
            }
            if transition.action >= expected {
                return Err(EstimatorError::Shape {
                    expected,
                    actual: transition.action + 1,
                }
                .into());
            }
            row[transition.action] = if transition.done {
                transition.reward
            } else {
                let best_next = next.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                transition.reward + self.config.gamma * best_next
            };
        }

        let loss = self.online.fit(&states, &targets)?;
        self.train_steps += 1;
        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);

        Ok(TrainOutcome::Trained { loss })
    }

    /// Copy the online parameters into the target estimator.
    pub fn sync_target(&mut self) {
        self.target.set_parameters(self.online.parameters());
    }

    /// Persist the online estimator.
    pub fn save(&self, path: &Path) -> Result<(), AgentError> {
        Ok(self.online.save_file(path)?)
    }

    /// Restore the online estimator. The target is left as is.
    pub fn load(&mut self, path: &Path) -> Result<(), AgentError> {
        Ok(self.online.load_file(path)?)
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Set epsilon when restoring from a checkpoint, kept within
    /// `[epsilon_min, 1]`.
    pub fn set_epsilon(&mut self, epsilon: f32) {
        self.epsilon = epsilon.min(1.0).max(self.config.epsilon_min);
    }

    pub fn train_steps(&self) -> usize {
        self.train_steps
    }

    pub fn replay_len(&self) -> usize {
        self.replay_buffer.len()
    }

    pub fn replay_buffer(&self) -> &ReplayBuffer<S> {
        &self.replay_buffer
    }

    pub fn config(&self) -> &DqnConfig {
        &self.config
    }

    pub fn online(&self) -> &E {
        &self.online
    }

    pub fn target(&self) -> &E {
        &self.target
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// A read-only view that always plays greedily and records nothing.
    pub fn greedy(&self) -> Greedy<'_, S, E> {
        Greedy { agent: self }
    }
}

/// Greedy, non-learning participant borrowed from a [`DqnAgent`].
pub struct Greedy<'a, S, E> {
    agent: &'a DqnAgent<S, E>,
}

impl<G, E> Participant<G> for Greedy<'_, G::State, E>
where
    G: Game,
    E: ValueEstimator<G::State>,
{
    fn play(&mut self, game: &G) -> Result<usize, AgentError> {
        let state = game.canonical_form(game.current_player());
        let mask = game.valid_moves();
        if mask.is_empty() {
            return Err(AgentError::NoLegalMove);
        }
        self.agent.greedy_action(&state, &mask)
    }

    fn name(&self) -> &str {
        "DQN (greedy)"
    }
}

impl DqnAgent<Board, NetworkEstimator> {
    /// Agent backed by two freshly initialized [`NetworkEstimator`]s.
    pub fn with_network(config: DqnConfig, rng: StdRng) -> Self {
        let network = DqnNetworkConfig::new().with_hidden_size(config.hidden_size);
        let online = NetworkEstimator::new(network.clone(), config.learning_rate);
        let target = NetworkEstimator::new(network, config.learning_rate);
        Self::new(config, online, target, rng)
    }
}

impl<G, E> Participant<G> for DqnAgent<G::State, E>
where
    G: Game,
    E: ValueEstimator<G::State>,
{
    fn play(&mut self, game: &G) -> Result<usize, AgentError> {
        self.act(game)
    }

    fn name(&self) -> &str {
        "DQN"
    }

    fn observe_outcome(&mut self, game: &G) -> Result<(), AgentError> {
        self.finish_episode(game);
        Ok(())
    }

    fn abort_episode(&mut self) {
        self.reset_episode();
    }
}
