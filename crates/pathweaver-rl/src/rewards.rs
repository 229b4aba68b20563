//! Reward computation for learning actions.
//!
//! The reward is a sum of independently weighted terms, every weight
//! configurable from JSON without recompiling:
//!
//! ```text
//! reward = familiarity × ( base + importance + style_bonus
//!                        + frontier_bonus + efficiency )
//!        + completion_bonus × [terminal]
//!
//! where base = 1 / (difficulty + 0.1)
//! ```
//!
//! The prerequisite gate short-circuits everything: when any prerequisite of
//! the action is below the mastery threshold, the reward is the penalty
//! scaled by `(1 - risk_tolerance)` and no other term applies. Under the
//! default weights no single term dominates the others by more than an order
//! of magnitude.

use pathweaver_core::{ConceptGraph, LearnerProfile};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::LearnerState;

/// Guards the base term against division by zero on trivial concepts.
const DIFFICULTY_OFFSET: f64 = 0.1;

fn default_completion_bonus() -> f64 {
    10.0
}
fn default_prerequisite_penalty() -> f64 {
    -5.0
}
fn default_importance_weight() -> f64 {
    3.0
}
fn default_style_match_bonus() -> f64 {
    2.0
}
fn default_frontier_bonus() -> f64 {
    1.5
}
fn default_efficiency_weight() -> f64 {
    0.2
}
fn default_low_mastery_cutoff() -> f64 {
    0.3
}
fn default_partial_familiarity() -> f64 {
    0.5
}
fn default_mastered_familiarity() -> f64 {
    0.1
}

/// Reward function weights - configurable via JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardWeights {
    /// Large bonus added once the resulting state is terminal
    #[serde(default = "default_completion_bonus")]
    pub completion_bonus: f64,

    /// Penalty (negative) for acting on a concept with unmet prerequisites,
    /// softened by the learner's risk tolerance
    #[serde(default = "default_prerequisite_penalty")]
    pub prerequisite_penalty: f64,

    /// Multiplier on degree centrality; well-connected concepts pay more
    #[serde(default = "default_importance_weight")]
    pub importance_weight: f64,

    /// Bonus when concept example text matches the declared learning style
    #[serde(default = "default_style_match_bonus")]
    pub style_match_bonus: f64,

    /// Bonus when the action sits on the current knowledge frontier
    #[serde(default = "default_frontier_bonus")]
    pub frontier_bonus: f64,

    /// Multiplier on out-degree; concepts that unlock more are worth more
    #[serde(default = "default_efficiency_weight")]
    pub efficiency_weight: f64,

    /// Mastery below this counts as unlearned (full reward magnitude)
    #[serde(default = "default_low_mastery_cutoff")]
    pub low_mastery_cutoff: f64,

    /// Familiarity factor for partially-learned concepts
    #[serde(default = "default_partial_familiarity")]
    pub partial_familiarity: f64,

    /// Familiarity factor for already-mastered concepts
    #[serde(default = "default_mastered_familiarity")]
    pub mastered_familiarity: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            completion_bonus: default_completion_bonus(),
            prerequisite_penalty: default_prerequisite_penalty(),
            importance_weight: default_importance_weight(),
            style_match_bonus: default_style_match_bonus(),
            frontier_bonus: default_frontier_bonus(),
            efficiency_weight: default_efficiency_weight(),
            low_mastery_cutoff: default_low_mastery_cutoff(),
            partial_familiarity: default_partial_familiarity(),
            mastered_familiarity: default_mastered_familiarity(),
        }
    }
}

/// Itemized reward components, returned alongside the total for diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewardBreakdown {
    pub base: f64,
    pub importance: f64,
    pub style_bonus: f64,
    pub frontier_bonus: f64,
    pub efficiency: f64,
    pub completion_bonus: f64,
    /// Set only when the prerequisite gate fired; all other fields are zero
    pub prerequisite_penalty: f64,
    /// Tier multiplier applied to the positive terms
    pub familiarity_factor: f64,
}

/// Scores a learning action against the graph and the learner profile.
///
/// Pure with respect to its inputs: the same `(state, action, next_state)`
/// tuple always yields the same reward.
#[derive(Debug, Clone)]
pub struct RewardFunction {
    graph: Arc<ConceptGraph>,
    profile: LearnerProfile,
    weights: RewardWeights,
    mastery_threshold: f64,
}

impl RewardFunction {
    pub fn new(
        graph: Arc<ConceptGraph>,
        profile: LearnerProfile,
        weights: RewardWeights,
        mastery_threshold: f64,
    ) -> Self {
        Self {
            graph,
            profile,
            weights,
            mastery_threshold,
        }
    }

    pub fn weights(&self) -> &RewardWeights {
        &self.weights
    }

    /// Scores taking `action` from `state`, landing in `next_state`.
    ///
    /// `terminal` marks whether `next_state` completed the curriculum (or
    /// mastered the learner's explicit goal). Mastery tiers are judged on
    /// the pre-action state, so the first visit to a concept always pays
    /// full magnitude.
    pub fn evaluate(
        &self,
        state: &LearnerState,
        action: usize,
        _next_state: &LearnerState,
        terminal: bool,
    ) -> (f64, RewardBreakdown) {
        let mut breakdown = RewardBreakdown::default();

        // Prerequisite gate: short-circuits every other term.
        let unmet = self
            .graph
            .prerequisites_of(action)
            .iter()
            .any(|&p| !state.is_mastered(p, self.mastery_threshold));
        if unmet {
            let softening = 1.0 - self.profile.clamped_risk_tolerance();
            breakdown.prerequisite_penalty = self.weights.prerequisite_penalty * softening;
            return (breakdown.prerequisite_penalty, breakdown);
        }

        breakdown.base =
            1.0 / (self.graph.difficulty(action, self.profile.level) + DIFFICULTY_OFFSET);

        breakdown.importance = self.weights.importance_weight * self.graph.centrality(action);

        if let Some(style) = self.profile.learning_style {
            let matched = self.graph.concept(action).examples.iter().any(|ex| {
                style.matches_text(&ex.name) || style.matches_text(&ex.description)
            });
            if matched {
                breakdown.style_bonus = self.weights.style_match_bonus;
            }
        }

        let mastered = state.mastered_set(self.mastery_threshold);
        if self.graph.frontier(&mastered).contains(&action) {
            breakdown.frontier_bonus = self.weights.frontier_bonus;
        }

        breakdown.efficiency = self.weights.efficiency_weight * self.graph.out_degree(action) as f64;

        breakdown.familiarity_factor = self.familiarity_factor(state.mastery(action));

        if terminal {
            breakdown.completion_bonus = self.weights.completion_bonus;
        }

        let positives = breakdown.base
            + breakdown.importance
            + breakdown.style_bonus
            + breakdown.frontier_bonus
            + breakdown.efficiency;
        let reward = breakdown.familiarity_factor * positives + breakdown.completion_bonus;

        (reward, breakdown)
    }

    /// Three-tier decay: unlearned concepts pay full magnitude, partially
    /// learned ones half, mastered ones a token amount.
    fn familiarity_factor(&self, mastery: f64) -> f64 {
        if mastery < self.weights.low_mastery_cutoff {
            1.0
        } else if mastery < self.mastery_threshold {
            self.weights.partial_familiarity
        } else {
            self.weights.mastered_familiarity
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathweaver_core::{parse_knowledge, LearnerLevel, LearningStyle};

    fn chain_graph() -> Arc<ConceptGraph> {
        let source = parse_knowledge(
            r#"{
                "a": { "difficulty": 0.4 },
                "b": {
                    "difficulty": 0.6,
                    "prerequisites": ["a"],
                    "examples": [
                        { "name": "heap diagram", "description": "visual walkthrough" }
                    ]
                },
                "c": { "difficulty": 0.5, "prerequisites": ["b"] }
            }"#,
        )
        .unwrap();
        Arc::new(ConceptGraph::from_knowledge(&source).unwrap())
    }

    fn reward_fn(graph: Arc<ConceptGraph>, profile: LearnerProfile) -> RewardFunction {
        RewardFunction::new(graph, profile, RewardWeights::default(), 0.7)
    }

    #[test]
    fn test_prerequisite_gate_short_circuits() {
        let graph = chain_graph();
        let b = graph.index_of("b").unwrap();
        let rf = reward_fn(graph.clone(), LearnerProfile::default());

        let locked = LearnerState::new(graph.len(), 0);
        let (reward, breakdown) = rf.evaluate(&locked, b, &locked, false);
        assert_eq!(reward, -5.0);
        assert_eq!(breakdown.base, 0.0);
        assert_eq!(breakdown.frontier_bonus, 0.0);
    }

    #[test]
    fn test_met_prerequisites_beat_unmet() {
        let graph = chain_graph();
        let a = graph.index_of("a").unwrap();
        let b = graph.index_of("b").unwrap();
        let rf = reward_fn(graph.clone(), LearnerProfile::default());

        let mut ready = LearnerState::new(graph.len(), a);
        ready.set_mastery(a, 1.0);
        let locked = LearnerState::new(graph.len(), a);

        let (with_prereq, _) = rf.evaluate(&ready, b, &ready, false);
        let (without_prereq, _) = rf.evaluate(&locked, b, &locked, false);
        assert!(with_prereq > without_prereq);
        assert!(without_prereq < 0.0);
    }

    #[test]
    fn test_risk_tolerance_softens_penalty() {
        let graph = chain_graph();
        let b = graph.index_of("b").unwrap();
        let locked = LearnerState::new(graph.len(), 0);

        let strict = reward_fn(graph.clone(), LearnerProfile::default());
        let tolerant = reward_fn(
            graph.clone(),
            LearnerProfile {
                risk_tolerance: 0.8,
                ..Default::default()
            },
        );

        let (strict_penalty, _) = strict.evaluate(&locked, b, &locked, false);
        let (soft_penalty, _) = tolerant.evaluate(&locked, b, &locked, false);
        assert!(soft_penalty > strict_penalty);
        assert!(soft_penalty < 0.0);
    }

    #[test]
    fn test_style_and_frontier_bonuses() {
        let graph = chain_graph();
        let a = graph.index_of("a").unwrap();
        let b = graph.index_of("b").unwrap();

        let visual = reward_fn(
            graph.clone(),
            LearnerProfile {
                learning_style: Some(LearningStyle::Visual),
                ..Default::default()
            },
        );

        let mut state = LearnerState::new(graph.len(), a);
        state.set_mastery(a, 0.9);
        let (_, breakdown) = visual.evaluate(&state, b, &state, false);
        assert_eq!(breakdown.style_bonus, 2.0);
        // "b" is exactly one hop past the mastered set.
        assert_eq!(breakdown.frontier_bonus, 1.5);

        let theoretical = reward_fn(
            graph,
            LearnerProfile {
                learning_style: Some(LearningStyle::Theoretical),
                ..Default::default()
            },
        );
        let (_, breakdown) = theoretical.evaluate(&state, b, &state, false);
        assert_eq!(breakdown.style_bonus, 0.0);
    }

    #[test]
    fn test_familiarity_tiers_order() {
        let graph = chain_graph();
        let a = graph.index_of("a").unwrap();
        let rf = reward_fn(graph.clone(), LearnerProfile::default());

        let fresh = LearnerState::new(graph.len(), a);
        let mut partial = fresh.clone();
        partial.set_mastery(a, 0.5);
        let mut known = fresh.clone();
        known.set_mastery(a, 0.9);

        let (unlearned, _) = rf.evaluate(&fresh, a, &fresh, false);
        let (developing, _) = rf.evaluate(&partial, a, &partial, false);
        let (mastered, _) = rf.evaluate(&known, a, &known, false);
        assert!(unlearned > developing);
        assert!(developing > mastered);
        assert!(mastered > 0.0);
    }

    #[test]
    fn test_completion_bonus_on_terminal() {
        let graph = chain_graph();
        let c = graph.index_of("c").unwrap();
        let rf = reward_fn(graph.clone(), LearnerProfile::default());

        let mut state = LearnerState::new(graph.len(), c);
        for idx in 0..graph.len() {
            state.set_mastery(idx, 0.9);
        }
        let (non_terminal, _) = rf.evaluate(&state, c, &state, false);
        let (terminal, breakdown) = rf.evaluate(&state, c, &state, true);
        assert!((terminal - non_terminal - 10.0).abs() < 1e-12);
        assert_eq!(breakdown.completion_bonus, 10.0);
    }

    #[test]
    fn test_level_scales_base_term() {
        let graph = chain_graph();
        let a = graph.index_of("a").unwrap();
        let state = LearnerState::new(graph.len(), a);

        let beginner = reward_fn(graph.clone(), LearnerProfile::default());
        let advanced = reward_fn(
            graph.clone(),
            LearnerProfile {
                level: LearnerLevel::Advanced,
                ..Default::default()
            },
        );
        let (_, b0) = beginner.evaluate(&state, a, &state, false);
        let (_, b1) = advanced.evaluate(&state, a, &state, false);
        // Same concept reads as easier for the advanced learner.
        assert!(b1.base > b0.base);
    }
}
