//! Match orchestration between two participants.

use std::fmt;

use tracing::{debug, info, warn};

use crate::ai::Participant;
use crate::error::ArenaError;
use crate::game::{Game, GameResult, Player};

/// Which of the arena's two participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Seat {
    First,
    Second,
}

impl Seat {
    pub fn other(self) -> Seat {
        match self {
            Seat::First => Seat::Second,
            Seat::Second => Seat::First,
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Seat::First => "first",
            Seat::Second => "second",
        })
    }
}

/// Aggregate of a session, always from the participants' point of view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionTally {
    pub first_wins: usize,
    pub second_wins: usize,
    pub draws: usize,
    /// Games in which the first participant moved first.
    pub first_as_red: usize,
    /// Games in which the second participant moved first.
    pub second_as_red: usize,
}

impl SessionTally {
    pub fn total(&self) -> usize {
        self.first_wins + self.second_wins + self.draws
    }

    /// Count one finished game in which `starting` played player one.
    pub fn record(&mut self, starting: Seat, result: GameResult) {
        match starting {
            Seat::First => self.first_as_red += 1,
            Seat::Second => self.second_as_red += 1,
        }
        match winning_seat(starting, result) {
            Some(Seat::First) => self.first_wins += 1,
            Some(Seat::Second) => self.second_wins += 1,
            None => self.draws += 1,
        }
    }
}

/// Seat controlling `player` when `starting` plays player one.
pub fn seat_for(starting: Seat, player: Player) -> Seat {
    match player {
        Player::Red => starting,
        Player::Yellow => starting.other(),
    }
}

/// Seat that won a terminal game, or `None` for a draw.
pub fn winning_seat(starting: Seat, result: GameResult) -> Option<Seat> {
    result.winner().map(|p| seat_for(starting, p))
}

/// Plays complete games between two participants on one game instance.
///
/// The arena itself makes no random choices; outcomes depend only on the
/// participants and the rules.
pub struct Arena<G, A, B> {
    game: G,
    first: A,
    second: B,
    verbose: bool,
}

impl<G, A, B> Arena<G, A, B>
where
    G: Game,
    A: Participant<G>,
    B: Participant<G>,
{
    pub fn new(game: G, first: A, second: B) -> Self {
        Arena {
            game,
            first,
            second,
            verbose: false,
        }
    }

    /// Trace every turn with the board rendering.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Play one game to completion with `starting` as player one.
    ///
    /// An illegal action aborts the game; it is never retried. On any error
    /// both participants get [`Participant::abort_episode`] before it is
    /// returned, so nothing from the abandoned game carries into the next.
    pub fn play_game(&mut self, starting: Seat) -> Result<GameResult, ArenaError> {
        let outcome = self.run_game(starting);
        if let Err(e) = &outcome {
            warn!(error = %e, %starting, "game aborted");
            self.first.abort_episode();
            self.second.abort_episode();
        }
        outcome
    }

    fn run_game(&mut self, starting: Seat) -> Result<GameResult, ArenaError> {
        self.game.reset();
        let mut turn = 0usize;

        loop {
            turn += 1;
            let player = self.game.current_player();
            let seat = seat_for(starting, player);
            if self.verbose {
                info!(turn, player = player.name(), %seat, "\n{}", self.game.display());
            }

            let action = match seat {
                Seat::First => self.first.play(&self.game),
                Seat::Second => self.second.play(&self.game),
            }
            .map_err(|source| ArenaError::Participant { seat, source })?;

            let mask = self.game.valid_moves();
            if !mask.is_legal(action) {
                return Err(ArenaError::IllegalAction {
                    participant: seat,
                    action,
                    legal: mask.legal_actions(),
                });
            }
            self.game.apply(action)?;

            let result = self.game.result();
            if result.is_terminal() {
                if self.verbose {
                    info!(turn, result = result.value(), "game over\n{}", self.game.display());
                }
                self.first
                    .observe_outcome(&self.game)
                    .map_err(|source| ArenaError::Participant {
                        seat: Seat::First,
                        source,
                    })?;
                self.second
                    .observe_outcome(&self.game)
                    .map_err(|source| ArenaError::Participant {
                        seat: Seat::Second,
                        source,
                    })?;
                debug!(turns = turn, ?result, %starting, "game finished");
                return Ok(result);
            }
        }
    }

    /// Play `games` games, the first half with the first participant moving
    /// first and the rest with the second. An odd game goes to the first half.
    pub fn play_session(&mut self, games: usize) -> Result<SessionTally, ArenaError> {
        let second_half = games / 2;
        let first_half = games - second_half;
        let mut tally = SessionTally::default();

        for (starting, count) in [(Seat::First, first_half), (Seat::Second, second_half)] {
            for _ in 0..count {
                let result = self.play_game(starting)?;
                tally.record(starting, result);
            }
            info!(
                %starting,
                games = count,
                first = self.first.name(),
                second = self.second.name(),
                first_wins = tally.first_wins,
                second_wins = tally.second_wins,
                draws = tally.draws,
                "session half complete"
            );
        }

        Ok(tally)
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn first(&self) -> &A {
        &self.first
    }

    pub fn second(&self) -> &B {
        &self.second
    }

    pub fn first_mut(&mut self) -> &mut A {
        &mut self.first
    }

    pub fn second_mut(&mut self) -> &mut B {
        &mut self.second
    }

    pub fn into_parts(self) -> (G, A, B) {
        (self.game, self.first, self.second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{ConnectFourAgent, DqnConfig, HumanPlayer, RandomPlayer, ScriptedPlayer};
    use crate::error::AgentError;
    use crate::game::{Board, ConnectFour, COLS, ROWS};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Cursor;

    /// Wraps a participant and checks the board on every turn it plays.
    struct Watched<P> {
        inner: P,
        plays: usize,
        outcomes: usize,
        aborts: usize,
        max_gap: usize,
    }

    impl<P> Watched<P> {
        fn new(inner: P) -> Self {
            Watched {
                inner,
                plays: 0,
                outcomes: 0,
                aborts: 0,
                max_gap: 0,
            }
        }
    }

    impl<P: Participant<ConnectFour>> Participant<ConnectFour> for Watched<P> {
        fn play(&mut self, game: &ConnectFour) -> Result<usize, AgentError> {
            let text = game.display();
            let gap = text.matches('X').count().abs_diff(text.matches('O').count());
            self.max_gap = self.max_gap.max(gap);
            self.plays += 1;
            self.inner.play(game)
        }

        fn name(&self) -> &str {
            self.inner.name()
        }

        fn observe_outcome(&mut self, game: &ConnectFour) -> Result<(), AgentError> {
            self.outcomes += 1;
            self.inner.observe_outcome(game)
        }

        fn abort_episode(&mut self) {
            self.aborts += 1;
            self.inner.abort_episode();
        }
    }

    /// Always answers with the same action, legal or not.
    struct Stubborn(usize);

    impl Participant<ConnectFour> for Stubborn {
        fn play(&mut self, _game: &ConnectFour) -> Result<usize, AgentError> {
            Ok(self.0)
        }

        fn name(&self) -> &str {
            "Stubborn"
        }
    }

    fn random(seed: u64) -> RandomPlayer {
        RandomPlayer::with_rng(StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_session_counts_sum_and_alternate() {
        let mut arena = Arena::new(ConnectFour::new(), random(1), random(2));
        let tally = arena.play_session(20).unwrap();
        assert_eq!(tally.total(), 20);
        assert_eq!(tally.first_as_red, 10);
        assert_eq!(tally.second_as_red, 10);
    }

    #[test]
    fn test_odd_session_gives_extra_game_to_first_half() {
        let mut arena = Arena::new(ConnectFour::new(), random(3), random(4));
        let tally = arena.play_session(7).unwrap();
        assert_eq!(tally.total(), 7);
        assert_eq!(tally.first_as_red, 4);
        assert_eq!(tally.second_as_red, 3);
    }

    #[test]
    fn test_column_scripts_terminate_with_balanced_pieces() {
        let first = Watched::new(ScriptedPlayer::new(vec![0]));
        let second = Watched::new(ScriptedPlayer::new(vec![1]));
        let mut arena = Arena::new(ConnectFour::new(), first, second).verbose(true);

        let result = arena.play_game(Seat::First).unwrap();
        assert_eq!(result, GameResult::Winner(Player::Red));

        let turns = arena.first().plays + arena.second().plays;
        assert!(turns <= ROWS * COLS);
        assert_eq!(turns, 7);
        assert!(arena.first().max_gap <= 1);
        assert!(arena.second().max_gap <= 1);
        assert_eq!(arena.first().outcomes, 1);
        assert_eq!(arena.second().outcomes, 1);
    }

    #[test]
    fn test_wins_are_attributed_to_seats_not_colours() {
        // Whoever moves first wins the column race.
        let first = ScriptedPlayer::new(vec![0]);
        let second = ScriptedPlayer::new(vec![1]);
        let mut arena = Arena::new(ConnectFour::new(), first, second);

        assert_eq!(
            arena.play_game(Seat::Second).unwrap(),
            GameResult::Winner(Player::Red)
        );
        let tally = arena.play_session(4).unwrap();
        assert_eq!(
            tally,
            SessionTally {
                first_wins: 2,
                second_wins: 2,
                draws: 0,
                first_as_red: 2,
                second_as_red: 2,
            }
        );
    }

    #[test]
    fn test_illegal_action_aborts_match() {
        let mut arena = Arena::new(ConnectFour::new(), ScriptedPlayer::new(vec![0]), Stubborn(0));
        match arena.play_game(Seat::First) {
            Err(ArenaError::IllegalAction {
                participant,
                action,
                legal,
            }) => {
                assert_eq!(participant, Seat::Second);
                assert_eq!(action, 0);
                assert_eq!(legal, vec![1, 2, 3, 4, 5, 6]);
            }
            other => panic!("expected illegal action, got {other:?}"),
        }

        let mut arena = Arena::new(ConnectFour::new(), Stubborn(COLS), random(5));
        assert!(matches!(
            arena.play_game(Seat::First),
            Err(ArenaError::IllegalAction { participant: Seat::First, .. })
        ));
    }

    #[test]
    fn test_aborted_game_notifies_both_participants() {
        let first = Watched::new(random(10));
        let second = Watched::new(Stubborn(COLS));
        let mut arena = Arena::new(ConnectFour::new(), first, second);

        assert!(arena.play_game(Seat::First).is_err());
        assert_eq!(arena.first().aborts, 1);
        assert_eq!(arena.second().aborts, 1);
        assert_eq!(arena.first().outcomes, 0);
    }

    #[test]
    fn test_aborted_game_leaves_no_transition_spanning_games() {
        let config = DqnConfig {
            hidden_size: 8,
            epsilon_start: 0.0,
            epsilon_min: 0.0,
            ..Default::default()
        };
        let mut agent = ConnectFourAgent::with_network(config, StdRng::seed_from_u64(12));

        let mut arena = Arena::new(ConnectFour::new(), &mut agent, Stubborn(COLS));
        assert!(matches!(
            arena.play_game(Seat::First),
            Err(ArenaError::IllegalAction { participant: Seat::Second, .. })
        ));
        drop(arena);
        assert!(!agent.has_pending());
        assert_eq!(agent.replay_len(), 0);

        let mut arena = Arena::new(ConnectFour::new(), &mut agent, random(13));
        arena.play_game(Seat::First).unwrap();
        drop(arena);
        assert!(agent.replay_len() > 0);
        let empty = Board::new();
        for transition in agent.replay_buffer().iter() {
            assert_ne!(transition.next_state, empty);
        }
        assert_eq!(agent.replay_buffer().iter().filter(|t| t.done).count(), 1);
    }

    #[test]
    fn test_participant_errors_surface_with_seat() {
        let human = HumanPlayer::new(Cursor::new(""), Vec::new()).show_board(false);
        let mut arena = Arena::new(ConnectFour::new(), random(6), human);
        match arena.play_game(Seat::Second) {
            Err(ArenaError::Participant { seat, source }) => {
                assert_eq!(seat, Seat::Second);
                assert!(matches!(source, AgentError::InputClosed));
            }
            other => panic!("expected participant error, got {other:?}"),
        }
    }

    #[test]
    fn test_sessions_are_reproducible() {
        let run = || {
            Arena::new(ConnectFour::new(), random(8), random(9))
                .play_session(10)
                .unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_draw_counts_for_nobody() {
        let mut tally = SessionTally::default();
        tally.record(Seat::Second, GameResult::Draw);
        tally.record(Seat::Second, GameResult::Winner(Player::Yellow));
        assert_eq!(tally.draws, 1);
        assert_eq!(tally.first_wins, 1);
        assert_eq!(tally.second_as_red, 2);
    }
}
