//! Experience replay: a bounded ring buffer of transitions.
//!
//! Replayed mini-batches decorrelate Q-table updates from the episode's
//! temporal order, improving sample efficiency over pure online learning.

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One environment transition, immutable once recorded.
///
/// `state` and `next_state` are the learner positions (Q-table rows); the
/// mastery vector itself stays with the environment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: usize,
    pub action: usize,
    pub reward: f64,
    pub next_state: usize,
    pub done: bool,
}

/// Fixed-capacity ring buffer; oldest transitions overwritten once full.
#[derive(Debug, Clone)]
pub struct ReplayBuffer {
    buffer: VecDeque<Transition>,
    capacity: usize,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a transition, evicting the oldest when at capacity.
    pub fn push(&mut self, transition: Transition) {
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
    }

    /// Draws `batch_size` transitions uniformly without replacement.
    ///
    /// Never fails: a batch larger than the buffer is clamped to the buffer
    /// length, and a single sample never contains duplicates.
    pub fn sample(&self, batch_size: usize, rng: &mut StdRng) -> Vec<Transition> {
        let amount = batch_size.min(self.buffer.len());
        rand::seq::index::sample(rng, self.buffer.len(), amount)
            .into_iter()
            .map(|idx| self.buffer[idx])
            .collect()
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
    use rand::SeedableRng;

    fn transition(tag: usize) -> Transition {
        Transition {
            state: tag,
            action: tag,
            reward: tag as f64,
            next_state: tag,
            done: false,
        }
    }

    #[test]
    fn test_ring_overwrites_oldest() {
        let mut buffer = ReplayBuffer::new(10);
        for i in 0..15 {
            buffer.push(transition(i));
        }
        assert_eq!(buffer.len(), 10);

        // Only the 10 most recent pushes survive.
        let mut rng = StdRng::seed_from_u64(0);
        let all = buffer.sample(10, &mut rng);
        let mut tags: Vec<usize> = all.iter().map(|t| t.state).collect();
        tags.sort_unstable();
        assert_eq!(tags, (5..15).collect::<Vec<_>>());
    }

    #[test]
    fn test_sample_clamps_and_never_duplicates() {
        let mut buffer = ReplayBuffer::new(8);
        for i in 0..4 {
            buffer.push(transition(i));
        }

        let mut rng = StdRng::seed_from_u64(1);
        let batch = buffer.sample(32, &mut rng);
        assert_eq!(batch.len(), 4);

        let mut tags: Vec<usize> = batch.iter().map(|t| t.state).collect();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), 4);
    }

    #[test]
    fn test_sample_from_empty() {
        let buffer = ReplayBuffer::new(4);
        let mut rng = StdRng::seed_from_u64(2);
        assert!(buffer.sample(3, &mut rng).is_empty());
    }
}
