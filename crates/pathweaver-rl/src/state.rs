//! Learner state: per-concept mastery plus the current position.
//!
//! One canonical representation, owned by a single environment. Mastery is
//! continuous in [0, 1]; the mastered set is always derived from the vector
//! against a threshold rather than stored separately, so the two can never
//! disagree.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Mutable learner state for one episode.
///
/// Created by `Environment::reset`, mutated only by `Environment::step`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LearnerState {
    /// Per-concept mastery in [0, 1]; 0 = unknown
    mastery: Vec<f64>,

    /// Concept most recently acted upon
    current_concept: usize,
}

impl LearnerState {
    /// Fresh state positioned at `start` with zero mastery everywhere.
    pub fn new(num_concepts: usize, start: usize) -> Self {
        Self {
            mastery: vec![0.0; num_concepts],
            current_concept: start,
        }
    }

    /// Number of concepts tracked.
    pub fn len(&self) -> usize {
        self.mastery.len()
    }

    /// True when the state tracks no concepts.
    pub fn is_empty(&self) -> bool {
        self.mastery.is_empty()
    }

    /// The concept most recently acted upon.
    pub fn current_concept(&self) -> usize {
        self.current_concept
    }

    /// Mastery level of a concept.
    pub fn mastery(&self, concept: usize) -> f64 {
        self.mastery[concept]
    }

    /// The full mastery vector.
    pub fn mastery_vector(&self) -> &[f64] {
        &self.mastery
    }

    /// True when the concept's mastery has reached `threshold`.
    pub fn is_mastered(&self, concept: usize, threshold: f64) -> bool {
        self.mastery[concept] >= threshold
    }

    /// The derived set of mastered concepts.
    pub fn mastered_set(&self, threshold: f64) -> BTreeSet<usize> {
        self.mastery
            .iter()
            .enumerate()
            .filter(|(_, &m)| m >= threshold)
            .map(|(c, _)| c)
            .collect()
    }

    /// True when every concept has reached `threshold`.
    pub fn all_mastered(&self, threshold: f64) -> bool {
        self.mastery.iter().all(|&m| m >= threshold)
    }

    pub(crate) fn set_current_concept(&mut self, concept: usize) {
        self.current_concept = concept;
    }

    /// Advances mastery toward 1 by a fraction of the remaining gap,
    /// producing diminishing-returns growth. Never decreases mastery.
    pub(crate) fn advance_mastery(&mut self, concept: usize, increment: f64) {
        let current = self.mastery[concept];
        self.mastery[concept] = (current + increment * (1.0 - current)).min(1.0);
    }

    /// Directly assigns a mastery level (prior-knowledge seeding at reset).
    pub(crate) fn set_mastery(&mut self, concept: usize, value: f64) {
        self.mastery[concept] = value.clamp(0.0, 1.0);
    }
}
