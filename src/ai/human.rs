use std::io::{BufRead, Write};

use super::agent::Participant;
use crate::error::AgentError;
use crate::game::Game;

/// Reads moves from a line-oriented input, re-prompting until a legal one arrives.
pub struct HumanPlayer<R, W> {
    input: R,
    output: W,
    show_board: bool,
}

impl<R: BufRead, W: Write> HumanPlayer<R, W> {
    pub fn new(input: R, output: W) -> Self {
        HumanPlayer {
            input,
            output,
            show_board: true,
        }
    }

    /// Whether to print the board before each prompt.
    pub fn show_board(mut self, show: bool) -> Self {
        self.show_board = show;
        self
    }
}

impl<G: Game, R: BufRead, W: Write> Participant<G> for HumanPlayer<R, W> {
    fn play(&mut self, game: &G) -> Result<usize, AgentError> {
        let legal = game.valid_moves().legal_actions();
        if legal.is_empty() {
            return Err(AgentError::NoLegalMove);
        }
        if self.show_board {
            writeln!(self.output, "{}", game.display())?;
        }
        writeln!(self.output, "Valid moves: {legal:?}")?;

        let mut line = String::new();
        loop {
            write!(self.output, "Choose your action: ")?;
            self.output.flush()?;
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                return Err(AgentError::InputClosed);
            }
            match line.trim().parse::<usize>() {
                Ok(action) if legal.contains(&action) => return Ok(action),
                _ => writeln!(self.output, "Invalid move. Please try again.")?,
            }
        }
    }

    fn name(&self) -> &str {
        "Human"
    }

    fn observe_outcome(&mut self, game: &G) -> Result<(), AgentError> {
        writeln!(self.output, "{}", game.display())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{ConnectFour, GameState};
    use std::io::Cursor;

    #[test]
    fn test_retries_until_legal() {
        let game = ConnectFour::from_state(GameState::from_moves(&[2; 6]).unwrap());
        let mut out = Vec::new();
        let mut human = HumanPlayer::new(Cursor::new("x\n2\n9\n 4 \n"), &mut out).show_board(false);
        assert_eq!(human.play(&game).unwrap(), 4);
        drop(human);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("Invalid move").count(), 3);
        assert!(text.contains("Valid moves: [0, 1, 3, 4, 5, 6]"));
    }

    #[test]
    fn test_eof_is_input_closed() {
        let game = ConnectFour::new();
        let mut human = HumanPlayer::new(Cursor::new("abc\n"), Vec::new());
        assert!(matches!(human.play(&game), Err(AgentError::InputClosed)));
    }
}
