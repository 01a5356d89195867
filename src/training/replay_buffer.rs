use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

use crate::ai::Transition;
use crate::error::BufferError;

/// Fixed-capacity ring buffer of transitions. Once full, each push overwrites
/// the oldest entry.
pub struct ReplayBuffer<S> {
    buffer: Vec<Transition<S>>,
    capacity: usize,
    position: usize,
    rng: StdRng,
}

impl<S: Clone> ReplayBuffer<S> {
    pub fn new(capacity: usize) -> Self {
        Self::with_rng(capacity, StdRng::from_os_rng())
    }

    /// Buffer sampling from the given random source.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_rng(capacity: usize, rng: StdRng) -> Self {
        assert!(capacity > 0, "replay buffer capacity must be > 0");
        ReplayBuffer {
            buffer: Vec::with_capacity(capacity),
            capacity,
            position: 0,
            rng,
        }
    }

    /// Add a transition, evicting the oldest when at capacity.
    pub fn push(&mut self, transition: Transition<S>) {
        if self.buffer.len() < self.capacity {
            self.buffer.push(transition);
        } else {
            self.buffer[self.position] = transition;
        }
        self.position = (self.position + 1) % self.capacity;
    }

    /// Draw `batch_size` distinct stored transitions uniformly at random.
    pub fn sample_batch(&mut self, batch_size: usize) -> Result<Vec<Transition<S>>, BufferError> {
        if batch_size > self.buffer.len() {
            return Err(BufferError::InsufficientData {
                requested: batch_size,
                available: self.buffer.len(),
            });
        }
        let indices = index::sample(&mut self.rng, self.buffer.len(), batch_size);
        Ok(indices.iter().map(|i| self.buffer[i].clone()).collect())
    }

    /// Stored transitions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Transition<S>> {
        let split = if self.buffer.len() < self.capacity {
            0
        } else {
            self.position
        };
        self.buffer[split..].iter().chain(self.buffer[..split].iter())
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.position = 0;
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn transition(id: usize) -> Transition<usize> {
        Transition {
            state: id,
            action: id % 7,
            reward: 0.0,
            next_state: id + 1,
            done: false,
        }
    }

    fn seeded(capacity: usize) -> ReplayBuffer<usize> {
        ReplayBuffer::with_rng(capacity, StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_push_and_len() {
        let mut buf = seeded(10);
        assert!(buf.is_empty());
        buf.push(transition(0));
        assert_eq!(buf.len(), 1);
        for id in 1..10 {
            buf.push(transition(id));
        }
        assert_eq!(buf.len(), 10);
        assert_eq!(buf.capacity(), 10);
    }

    #[test]
    fn test_overflow_keeps_most_recent_in_order() {
        let mut buf = seeded(5);
        for id in 0..13 {
            buf.push(transition(id));
        }
        assert_eq!(buf.len(), 5);
        let ids: Vec<usize> = buf.iter().map(|t| t.state).collect();
        assert_eq!(ids, vec![8, 9, 10, 11, 12]);
    }

    #[test]
    fn test_iter_before_full_is_insertion_order() {
        let mut buf = seeded(5);
        for id in 0..3 {
            buf.push(transition(id));
        }
        let ids: Vec<usize> = buf.iter().map(|t| t.state).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_sample_is_without_replacement() {
        let mut buf = seeded(100);
        for id in 0..50 {
            buf.push(transition(id));
        }
        let batch = buf.sample_batch(50).unwrap();
        let distinct: HashSet<usize> = batch.iter().map(|t| t.state).collect();
        assert_eq!(distinct.len(), 50);
    }

    #[test]
    fn test_sample_too_many_is_insufficient_data() {
        let mut buf = seeded(10);
        buf.push(transition(0));
        assert_eq!(
            buf.sample_batch(5).unwrap_err(),
            BufferError::InsufficientData {
                requested: 5,
                available: 1
            }
        );
    }

    #[test]
    fn test_same_seed_same_batches() {
        let mut a = seeded(32);
        let mut b = seeded(32);
        for id in 0..32 {
            a.push(transition(id));
            b.push(transition(id));
        }
        let batch_a: Vec<usize> = a.sample_batch(8).unwrap().iter().map(|t| t.state).collect();
        let batch_b: Vec<usize> = b.sample_batch(8).unwrap().iter().map(|t| t.state).collect();
        assert_eq!(batch_a, batch_b);
    }

    #[test]
    fn test_clear() {
        let mut buf = seeded(4);
        for id in 0..6 {
            buf.push(transition(id));
        }
        buf.clear();
        assert!(buf.is_empty());
        buf.push(transition(42));
        assert_eq!(buf.iter().next().map(|t| t.state), Some(42));
    }
}
