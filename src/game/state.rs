use super::board::{Board, DropError, COLS};
use super::{ActionMask, GameResult, Player};
use crate::error::GameError;

/// Immutable Connect Four position: board, side to move and result together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameState {
    board: Board,
    current_player: Player,
    result: GameResult,
}

impl GameState {
    /// Empty board, Red to move.
    pub fn initial() -> Self {
        GameState {
            board: Board::new(),
            current_player: Player::Red,
            result: GameResult::Ongoing,
        }
    }

    /// Replay a sequence of columns from the initial position.
    pub fn from_moves(columns: &[usize]) -> Result<Self, GameError> {
        columns
            .iter()
            .try_fold(Self::initial(), |state, &col| state.apply_move(col))
    }

    pub fn current_player(&self) -> Player {
        self.current_player
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn result(&self) -> GameResult {
        self.result
    }

    pub fn is_terminal(&self) -> bool {
        self.result.is_terminal()
    }

    /// Legal columns; all-zero once the game is over.
    pub fn valid_moves(&self) -> ActionMask {
        if self.is_terminal() {
            return ActionMask::none(COLS);
        }
        ActionMask::from_fn(COLS, |col| !self.board.is_column_full(col))
    }

    /// Apply a move and return the successor position.
    pub fn apply_move(&self, column: usize) -> Result<GameState, GameError> {
        if self.is_terminal() {
            return Err(GameError::GameOver);
        }

        let mut board = self.board;
        let row = board
            .drop_piece(column, self.current_player.to_cell())
            .map_err(|e| match e {
                DropError::ColumnFull | DropError::InvalidColumn => GameError::IllegalAction {
                    action: column,
                    legal: self.valid_moves().legal_actions(),
                },
            })?;

        let result = if board.check_win(row, column) {
            GameResult::Winner(self.current_player)
        } else if board.is_full() {
            GameResult::Draw
        } else {
            GameResult::Ongoing
        };

        Ok(GameState {
            board,
            current_player: self.current_player.other(),
            result,
        })
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::initial()
    }
}
