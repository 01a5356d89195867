mod dqn;

pub use dqn::{reward_for, DqnAgent, DqnConfig, Greedy, TrainOutcome};

use crate::ai::networks::NetworkEstimator;
use crate::game::Board;

/// DQN agent over Connect Four boards with the default network.
pub type ConnectFourAgent = DqnAgent<Board, NetworkEstimator>;
