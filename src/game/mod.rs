//! Turn-based game contract consumed by agents and the arena, plus the
//! Connect Four implementation of it.

mod board;
mod connect_four;
mod player;
mod state;

use std::fmt::Debug;
use std::hash::Hash;

pub use board::{mirror_column, mirror_columns, Board, Cell, DropError, COLS, ROWS};
pub use connect_four::ConnectFour;
pub use player::Player;
pub use state::GameState;

use crate::error::GameError;

/// Outcome of a game as seen by an observer, not by either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameResult {
    Ongoing,
    Winner(Player),
    Draw,
}

impl GameResult {
    /// Numeric encoding used in traces: 0 ongoing, +1/-1 for a win by player
    /// one/two, and a small positive sentinel for a draw.
    pub const DRAW_VALUE: f32 = 1e-4;

    pub fn is_terminal(self) -> bool {
        !matches!(self, GameResult::Ongoing)
    }

    pub fn winner(self) -> Option<Player> {
        match self {
            GameResult::Winner(p) => Some(p),
            _ => None,
        }
    }

    pub fn value(self) -> f32 {
        match self {
            GameResult::Ongoing => 0.0,
            GameResult::Winner(p) => f32::from(p.sign()),
            GameResult::Draw => Self::DRAW_VALUE,
        }
    }
}

/// One flag per action index; `true` means legal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionMask(Vec<bool>);

impl ActionMask {
    /// A mask of `size` actions, none legal.
    pub fn none(size: usize) -> Self {
        ActionMask(vec![false; size])
    }

    pub fn from_fn(size: usize, f: impl Fn(usize) -> bool) -> Self {
        ActionMask((0..size).map(f).collect())
    }

    /// Size of the action space, legal or not.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no action is legal.
    pub fn is_empty(&self) -> bool {
        !self.0.iter().any(|&legal| legal)
    }

    pub fn is_legal(&self, action: usize) -> bool {
        self.0.get(action).copied().unwrap_or(false)
    }

    pub fn legal_actions(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, &legal)| legal.then_some(i))
            .collect()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }
}

/// Deterministic two-player turn-based state machine.
///
/// The game owns its position; it changes only through [`Game::apply`] and
/// [`Game::reset`]. Action indices live in `[0, action_count())`.
pub trait Game {
    /// Snapshot handed to agents: must be hashable so it can key caches.
    type State: Clone + PartialEq + Eq + Hash + Debug;

    /// Size of the fixed action space.
    fn action_count(&self) -> usize;

    /// Return to the initial position and hand back its state. Player one
    /// ([`Player::Red`]) is to move.
    fn reset(&mut self) -> Self::State;

    /// Side to move. After a terminal move this is the side that would move next.
    fn current_player(&self) -> Player;

    /// Legal actions; all-zero once the game is terminal.
    fn valid_moves(&self) -> ActionMask;

    /// Play `action` for the current player.
    ///
    /// Fails with [`GameError::IllegalAction`] when the mask does not allow it
    /// and with [`GameError::GameOver`] once a result has been reached.
    fn apply(&mut self, action: usize) -> Result<(Self::State, Player), GameError>;

    fn result(&self) -> GameResult;

    /// The state from `player`'s perspective: their pieces are positive.
    fn canonical_form(&self, player: Player) -> Self::State;

    /// Human-readable rendering for diagnostics.
    fn display(&self) -> String;

    /// Left-right reflection of `state`, for games that are symmetric under it.
    fn mirror_state(_state: &Self::State) -> Option<Self::State> {
        None
    }

    /// The action matching `action` on the mirrored state.
    fn mirror_action(action: usize) -> usize {
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_values() {
        assert_eq!(GameResult::Ongoing.value(), 0.0);
        assert_eq!(GameResult::Winner(Player::Red).value(), 1.0);
        assert_eq!(GameResult::Winner(Player::Yellow).value(), -1.0);
        assert!(GameResult::Draw.value() > 0.0 && GameResult::Draw.value() < 1e-3);
        assert!(!GameResult::Ongoing.is_terminal());
        assert!(GameResult::Draw.is_terminal());
    }

    #[test]
    fn test_action_mask() {
        let mask = ActionMask::from_fn(5, |i| i % 2 == 0);
        assert_eq!(mask.len(), 5);
        assert_eq!(mask.legal_actions(), vec![0, 2, 4]);
        assert!(mask.is_legal(2));
        assert!(!mask.is_legal(3));
        assert!(!mask.is_legal(99));
        assert!(!mask.is_empty());
        assert!(ActionMask::none(7).is_empty());
    }
}
