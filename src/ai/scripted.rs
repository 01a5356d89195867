use super::agent::Participant;
use crate::error::AgentError;
use crate::game::Game;

/// Plays the first legal column from a fixed preference list, falling back to
/// the lowest legal column.
#[derive(Debug, Clone)]
pub struct ScriptedPlayer {
    preferences: Vec<usize>,
    name: String,
}

impl ScriptedPlayer {
    pub fn new(preferences: Vec<usize>) -> Self {
        let name = format!("Scripted{preferences:?}");
        ScriptedPlayer { preferences, name }
    }
}

impl<G: Game> Participant<G> for ScriptedPlayer {
    fn play(&mut self, game: &G) -> Result<usize, AgentError> {
        let mask = game.valid_moves();
        self.preferences
            .iter()
            .copied()
            .find(|&a| mask.is_legal(a))
            .or_else(|| mask.legal_actions().first().copied())
            .ok_or(AgentError::NoLegalMove)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{ConnectFour, GameState};

    #[test]
    fn test_follows_preferences_then_falls_back() {
        let mut player = ScriptedPlayer::new(vec![3, 1]);
        let game = ConnectFour::new();
        assert_eq!(player.play(&game).unwrap(), 3);

        let game = ConnectFour::from_state(GameState::from_moves(&[3; 6]).unwrap());
        assert_eq!(player.play(&game).unwrap(), 1);

        let moves = [[3; 6], [1; 6], [0; 6]].concat();
        let game = ConnectFour::from_state(GameState::from_moves(&moves).unwrap());
        assert_eq!(player.play(&game).unwrap(), 2);
    }
}
