mod dqn_network;

pub use dqn_network::{DqnNetwork, DqnNetworkConfig, NetworkEstimator};
