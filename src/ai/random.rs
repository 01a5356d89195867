use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use super::agent::Participant;
use crate::error::AgentError;
use crate::game::Game;

/// Picks uniformly at random among legal actions.
pub struct RandomPlayer {
    rng: StdRng,
}

impl RandomPlayer {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    pub fn with_rng(rng: StdRng) -> Self {
        RandomPlayer { rng }
    }
}

impl Default for RandomPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: Game> Participant<G> for RandomPlayer {
    fn play(&mut self, game: &G) -> Result<usize, AgentError> {
        let legal = game.valid_moves().legal_actions();
        if legal.is_empty() {
            return Err(AgentError::NoLegalMove);
        }
        Ok(legal[self.rng.random_range(0..legal.len())])
    }

    fn name(&self) -> &str {
        "Random"
    }
}
