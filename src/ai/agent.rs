use crate::error::AgentError;
use crate::game::Game;

/// One step of experience, as seen by the agent that acted.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<S> {
    pub state: S,
    pub action: usize,
    pub reward: f32,
    pub next_state: S,
    pub done: bool,
}

/// Anything that can take a seat in an [`Arena`](crate::arena::Arena).
pub trait Participant<G: Game> {
    /// Choose an action for the side to move in `game`.
    ///
    /// Only called while the game is ongoing and it is this participant's turn.
    fn play(&mut self, game: &G) -> Result<usize, AgentError>;

    /// Display name for logs and tallies.
    fn name(&self) -> &str;

    /// Called once for each participant when a game reaches a terminal result.
    fn observe_outcome(&mut self, _game: &G) -> Result<(), AgentError> {
        Ok(())
    }

    /// Called on both participants when a game is abandoned before a result.
    fn abort_episode(&mut self) {}
}

impl<G: Game, P: Participant<G> + ?Sized> Participant<G> for Box<P> {
    fn play(&mut self, game: &G) -> Result<usize, AgentError> {
        (**self).play(game)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn observe_outcome(&mut self, game: &G) -> Result<(), AgentError> {
        (**self).observe_outcome(game)
    }

    fn abort_episode(&mut self) {
        Participant::<G>::abort_episode(&mut **self)
    }
}

impl<G: Game, P: Participant<G> + ?Sized> Participant<G> for &mut P {
    fn play(&mut self, game: &G) -> Result<usize, AgentError> {
        (**self).play(game)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn observe_outcome(&mut self, game: &G) -> Result<(), AgentError> {
        (**self).observe_outcome(game)
    }

    fn abort_episode(&mut self) {
        Participant::<G>::abort_episode(&mut **self)
    }
}
