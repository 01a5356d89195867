use std::collections::VecDeque;

use crate::arena::Seat;

/// Result of a single training game, from the arena's seats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeResult {
    /// Winning seat, `None` for a draw.
    pub winner: Option<Seat>,
    pub game_length: usize,
}

/// Training metrics tracker with rolling window computations.
pub struct TrainingMetrics {
    episode_results: VecDeque<EpisodeResult>,
    update_losses: VecDeque<f32>,
    capacity: usize,
    total_episodes: usize, // lifetime count, never capped
    skipped_updates: usize,
}

impl TrainingMetrics {
    pub fn with_capacity(capacity: usize) -> Self {
        TrainingMetrics {
            episode_results: VecDeque::with_capacity(capacity),
            update_losses: VecDeque::with_capacity(capacity),
            capacity,
            total_episodes: 0,
            skipped_updates: 0,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn record_episode(&mut self, result: EpisodeResult) {
        self.total_episodes += 1;
        self.episode_results.push_back(result);
        if self.episode_results.len() > self.capacity {
            self.episode_results.pop_front();
        }
    }

    pub fn record_update(&mut self, loss: f32) {
        self.update_losses.push_back(loss);
        if self.update_losses.len() > self.capacity {
            self.update_losses.pop_front();
        }
    }

    pub fn record_skipped_update(&mut self) {
        self.skipped_updates += 1;
    }

    fn rate(&self, last_n: usize, pred: impl Fn(&EpisodeResult) -> bool) -> f32 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let hits = self
            .episode_results
            .iter()
            .rev()
            .take(n)
            .filter(|r| pred(r))
            .count();
        hits as f32 / n as f32
    }

    /// Fraction of the last N episodes won by `seat`.
    pub fn win_rate(&self, seat: Seat, last_n: usize) -> f32 {
        self.rate(last_n, |r| r.winner == Some(seat))
    }

    /// Draw rate in the last N episodes.
    pub fn draw_rate(&self, last_n: usize) -> f32 {
        self.rate(last_n, |r| r.winner.is_none())
    }

    /// Average loss over the last N updates.
    pub fn average_loss(&self, last_n: usize) -> f32 {
        let n = self.update_losses.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let sum: f32 = self.update_losses.iter().rev().take(n).sum();
        sum / n as f32
    }

    /// Average game length over the last N episodes.
    pub fn average_game_length(&self, last_n: usize) -> f32 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let total: usize = self
            .episode_results
            .iter()
            .rev()
            .take(n)
            .map(|r| r.game_length)
            .sum();
        total as f32 / n as f32
    }

    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }

    pub fn skipped_updates(&self) -> usize {
        self.skipped_updates
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new()
    }
}
