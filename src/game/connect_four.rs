use super::board::{mirror_column, Board, COLS};
use super::{ActionMask, Game, GameResult, GameState, Player};
use crate::error::GameError;

/// Connect Four behind the [`Game`] contract.
///
/// Holds one immutable [`GameState`] and swaps it wholesale on every move.
#[derive(Debug, Clone, Default)]
pub struct ConnectFour {
    state: GameState,
}

impl ConnectFour {
    pub fn new() -> Self {
        Self::default()
    }

    /// A game positioned at `state`, without replaying moves.
    pub fn from_state(state: GameState) -> Self {
        ConnectFour { state }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }
}

impl Game for ConnectFour {
    type State = Board;

    fn action_count(&self) -> usize {
        COLS
    }

    fn reset(&mut self) -> Board {
        self.state = GameState::initial();
        *self.state.board()
    }

    fn current_player(&self) -> Player {
        self.state.current_player()
    }

    fn valid_moves(&self) -> ActionMask {
        self.state.valid_moves()
    }

    fn apply(&mut self, action: usize) -> Result<(Board, Player), GameError> {
        self.state = self.state.apply_move(action)?;
        Ok((*self.state.board(), self.state.current_player()))
    }

    fn result(&self) -> GameResult {
        self.state.result()
    }

    fn canonical_form(&self, player: Player) -> Board {
        match player {
            Player::Red => *self.state.board(),
            Player::Yellow => self.state.board().flipped(),
        }
    }

    fn display(&self) -> String {
        self.state.board().to_string()
    }

    fn mirror_state(state: &Board) -> Option<Board> {
        Some(state.mirrored())
    }

    fn mirror_action(action: usize) -> usize {
        mirror_column(action)
    }
}
