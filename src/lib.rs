//! # Connect Four Arena
//!
//! A Connect Four engine, an epsilon-greedy DQN agent with experience replay
//! and a target network, and an arena that plays sessions between any two
//! participants. Networks are built with the Burn ML framework on the NdArray
//! CPU backend.
//!
//! ## Modules
//!
//! - [`game`]: the `Game` contract and its Connect Four implementation
//! - [`ai`]: participants, the value-estimator contract, the DQN agent and its network
//! - [`arena`]: single games and seat-alternating sessions between two participants
//! - [`training`]: trainer loop, replay buffer, rolling metrics
//! - [`checkpoint`]: weights plus JSON metadata on disk
//! - [`config`]: TOML configuration loading and validation
//! - [`error`]: structured error types

#![recursion_limit = "256"]

pub mod ai;
pub mod arena;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod game;
pub mod training;
