mod agent;
pub mod algorithms;
mod estimator;
mod human;
pub mod networks;
mod random;
mod scripted;
pub mod state_encoding;

pub use agent::{Participant, Transition};
pub use algorithms::{ConnectFourAgent, DqnAgent, DqnConfig, Greedy, TrainOutcome};
pub use estimator::ValueEstimator;
pub use human::HumanPlayer;
pub use networks::{DqnNetwork, DqnNetworkConfig, NetworkEstimator};
pub use random::RandomPlayer;
pub use scripted::ScriptedPlayer;
