//! Learning environment: the state machine the agent trains against.
//!
//! States combine the learner's position (current concept) with the full
//! mastery vector; the position indexes the Q-table, eligibility checks
//! consult the vector. Two thresholds govern progress:
//!
//! - **mastery threshold** (default 0.7): a concept counts as mastered for
//!   prerequisite satisfaction and episode termination;
//! - **eligibility threshold** (default 0.5): the softer gate used by
//!   `valid_actions`, keeping near-ready concepts open to exploration.
//!
//! In-episode violations never raise: an out-of-range action or an unmet
//! prerequisite is signalled through the reward and absorbed by training.

use pathweaver_core::{ConceptGraph, LearnerProfile, PathweaverError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::rewards::{RewardBreakdown, RewardFunction, RewardWeights};
use crate::state::LearnerState;

fn default_mastery_threshold() -> f64 {
    0.7
}
fn default_eligibility_threshold() -> f64 {
    0.5
}
fn default_learning_increment() -> f64 {
    0.3
}
fn default_invalid_action_penalty() -> f64 {
    -10.0
}

/// Environment tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvConfig {
    /// Mastery level at which a concept counts as mastered
    #[serde(default = "default_mastery_threshold")]
    pub mastery_threshold: f64,

    /// Softer gate for `valid_actions`; intentionally below the mastery
    /// threshold so exploration stays available at the edge of competence
    #[serde(default = "default_eligibility_threshold")]
    pub eligibility_threshold: f64,

    /// Fraction of the remaining mastery gap closed per successful step
    #[serde(default = "default_learning_increment")]
    pub learning_increment: f64,

    /// Fixed reward for actions outside [0, N); strongly negative
    #[serde(default = "default_invalid_action_penalty")]
    pub invalid_action_penalty: f64,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            mastery_threshold: default_mastery_threshold(),
            eligibility_threshold: default_eligibility_threshold(),
            learning_increment: default_learning_increment(),
            invalid_action_penalty: default_invalid_action_penalty(),
        }
    }
}

/// Result of one environment step.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// Learner state after the step
    pub state: LearnerState,
    pub reward: f64,
    pub done: bool,
    /// Itemized reward terms; `None` for out-of-range actions
    pub breakdown: Option<RewardBreakdown>,
}

/// Single-learner environment wrapping the concept graph.
///
/// Owns its `LearnerState` exclusively; only the read-only graph may be
/// shared with other components.
pub struct Environment {
    graph: Arc<ConceptGraph>,
    config: EnvConfig,
    reward_fn: RewardFunction,
    state: LearnerState,
    rng: StdRng,
    /// Resolved goal concept; once mastered the episode terminates early
    goal: Option<usize>,
    /// Resolved prior-knowledge concepts, seeded as mastered on reset
    prior_known: Vec<usize>,
}

impl Environment {
    /// Builds an environment for one learner.
    ///
    /// Profile names that resolve to no concept are reported and skipped
    /// rather than failing construction. Pass a seed for reproducible
    /// start-concept selection.
    pub fn new(
        graph: Arc<ConceptGraph>,
        profile: LearnerProfile,
        weights: RewardWeights,
        config: EnvConfig,
        seed: Option<u64>,
    ) -> Self {
        let goal = profile.learning_goal.as_deref().and_then(|name| {
            let idx = graph.index_of(name);
            if idx.is_none() {
                log::warn!("Learning goal '{}' not present in the concept graph", name);
            }
            idx
        });

        let prior_known: Vec<usize> = profile
            .prior_knowledge
            .iter()
            .filter_map(|name| {
                let idx = graph.index_of(name);
                if idx.is_none() {
                    log::warn!("Prior-knowledge concept '{}' not in the graph, skipping", name);
                }
                idx
            })
            .collect();

        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        let num_concepts = graph.len();
        let reward_fn = RewardFunction::new(
            graph.clone(),
            profile,
            weights,
            config.mastery_threshold,
        );

        Self {
            graph,
            config,
            reward_fn,
            state: LearnerState::new(num_concepts, 0),
            rng,
            goal,
            prior_known,
        }
    }

    /// Resets to a fresh episode.
    ///
    /// With an explicit start the concept index is range-checked; without
    /// one, a uniform choice is made among concepts with no prerequisites.
    /// Mastery is zeroed, then prior-knowledge concepts are re-seeded at the
    /// mastery threshold.
    pub fn reset(&mut self, start: Option<usize>) -> Result<&LearnerState, PathweaverError> {
        let n = self.graph.len();
        let start = match start {
            Some(s) => {
                if s >= n {
                    return Err(PathweaverError::invalid_start(s, n));
                }
                s
            }
            None => {
                let roots = self.graph.roots();
                if roots.is_empty() {
                    return Err(PathweaverError::config(
                        "no concepts without prerequisites; the prerequisite relation is cyclic",
                    ));
                }
                roots[self.rng.gen_range(0..roots.len())]
            }
        };

        self.state = LearnerState::new(n, start);
        for &concept in &self.prior_known {
            self.state
                .set_mastery(concept, self.config.mastery_threshold);
        }
        Ok(&self.state)
    }

    /// Takes one learning action.
    ///
    /// Never fails and never corrupts state: out-of-range actions return the
    /// unchanged state with a fixed penalty; unmet prerequisites move the
    /// position but not the mastery. A satisfied action closes a fraction of
    /// the remaining mastery gap.
    pub fn step(&mut self, action: usize) -> StepOutcome {
        if action >= self.graph.len() {
            return StepOutcome {
                state: self.state.clone(),
                reward: self.config.invalid_action_penalty,
                done: false,
                breakdown: None,
            };
        }

        let before = self.state.clone();
        let prerequisites_met = self
            .graph
            .prerequisites_of(action)
            .iter()
            .all(|&p| before.is_mastered(p, self.config.mastery_threshold));

        self.state.set_current_concept(action);
        if prerequisites_met {
            self.state
                .advance_mastery(action, self.config.learning_increment);
        }

        let done = self.is_terminal(&self.state);
        let (reward, breakdown) = self.reward_fn.evaluate(&before, action, &self.state, done);

        StepOutcome {
            state: self.state.clone(),
            reward,
            done,
            breakdown: Some(breakdown),
        }
    }

    /// Concepts whose prerequisites all sit at or above the eligibility
    /// threshold. Looser than the mastery gate on purpose; a near-mastered
    /// prerequisite keeps its dependents explorable.
    pub fn valid_actions(&self) -> Vec<usize> {
        (0..self.graph.len())
            .filter(|&c| {
                self.graph
                    .prerequisites_of(c)
                    .iter()
                    .all(|&p| self.state.mastery(p) >= self.config.eligibility_threshold)
            })
            .collect()
    }

    fn is_terminal(&self, state: &LearnerState) -> bool {
        match self.goal {
            Some(goal) => state.is_mastered(goal, self.config.mastery_threshold),
            None => state.all_mastered(self.config.mastery_threshold),
        }
    }

    pub fn state(&self) -> &LearnerState {
        &self.state
    }

    pub fn current_concept(&self) -> usize {
        self.state.current_concept()
    }

    pub fn graph(&self) -> &Arc<ConceptGraph> {
        &self.graph
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathweaver_core::parse_knowledge;
    use std::collections::BTreeSet;

    fn chain_env(seed: u64) -> Environment {
        let source = parse_knowledge(
            r#"{
                "a": { "difficulty": 0.3 },
                "b": { "difficulty": 0.5, "prerequisites": ["a"] },
                "c": { "difficulty": 0.6, "prerequisites": ["b"] }
            }"#,
        )
        .unwrap();
        let graph = Arc::new(ConceptGraph::from_knowledge(&source).unwrap());
        Environment::new(
            graph,
            LearnerProfile::default(),
            RewardWeights::default(),
            EnvConfig::default(),
            Some(seed),
        )
    }

    fn forked_env(seed: u64) -> Environment {
        let source = parse_knowledge(
            r#"{
                "r1": {},
                "r2": {},
                "r3": {},
                "leaf": { "prerequisites": ["r1", "r2"] }
            }"#,
        )
        .unwrap();
        let graph = Arc::new(ConceptGraph::from_knowledge(&source).unwrap());
        Environment::new(
            graph,
            LearnerProfile::default(),
            RewardWeights::default(),
            EnvConfig::default(),
            Some(seed),
        )
    }

    #[test]
    fn test_reset_out_of_range() {
        let mut env = chain_env(1);
        let err = env.reset(Some(99)).unwrap_err();
        assert!(matches!(
            err,
            PathweaverError::InvalidStart {
                start: 99,
                num_concepts: 3
            }
        ));
    }

    #[test]
    fn test_random_reset_covers_all_roots() {
        let mut env = forked_env(42);
        let roots: BTreeSet<usize> = env.graph().roots().into_iter().collect();
        assert_eq!(roots.len(), 3);

        let mut seen = BTreeSet::new();
        for _ in 0..200 {
            let state = env.reset(None).unwrap();
            seen.insert(state.current_concept());
        }
        assert_eq!(seen, roots);
    }

    #[test]
    fn test_invalid_action_is_a_soft_failure() {
        let mut env = chain_env(2);
        env.reset(Some(0)).unwrap();
        let mastery_before = env.state().mastery_vector().to_vec();
        let position_before = env.current_concept();

        let outcome = env.step(17);
        assert_eq!(outcome.reward, -10.0);
        assert!(!outcome.done);
        assert!(outcome.breakdown.is_none());
        assert_eq!(env.state().mastery_vector(), mastery_before.as_slice());
        assert_eq!(env.current_concept(), position_before);
    }

    #[test]
    fn test_locked_concept_penalized_but_position_moves() {
        let mut env = chain_env(3);
        env.reset(Some(0)).unwrap();

        let b = env.graph().index_of("b").unwrap();
        let outcome = env.step(b);
        assert!(outcome.reward < 0.0);
        assert_eq!(env.state().mastery(b), 0.0);
        assert_eq!(env.current_concept(), b);
        assert!(!outcome.done);
    }

    #[test]
    fn test_mastery_monotone_and_rewards_decay() {
        let mut env = chain_env(4);
        env.reset(Some(0)).unwrap();
        let a = env.graph().index_of("a").unwrap();

        let first = env.step(a);
        let mut last_mastery = env.state().mastery(a);
        assert!(first.reward > 0.0);

        // Drive to mastery; mastery never decreases.
        let mut mastered_reward = None;
        for _ in 0..20 {
            let outcome = env.step(a);
            let mastery = env.state().mastery(a);
            assert!(mastery >= last_mastery);
            last_mastery = mastery;
            if env.state().is_mastered(a, 0.7) {
                mastered_reward = Some(outcome.reward);
            }
        }

        // Re-stepping a mastered concept lands in the lowest reward tier.
        let final_reward = env.step(a).reward;
        assert!(final_reward > 0.0);
        assert!(final_reward < first.reward);
        assert!(mastered_reward.unwrap() <= first.reward);
        let weights = RewardWeights::default();
        assert!(final_reward <= weights.mastered_familiarity * first.reward + 1e-9);
    }

    #[test]
    fn test_eligibility_gate_is_softer_than_mastery_gate() {
        let mut env = chain_env(5);
        env.reset(Some(0)).unwrap();
        let a = env.graph().index_of("a").unwrap();
        let b = env.graph().index_of("b").unwrap();

        // Two steps: mastery(a) = 0.51, eligible for exploration but not
        // yet mastered for the reward gate.
        env.step(a);
        env.step(a);
        let mastery = env.state().mastery(a);
        assert!(mastery >= 0.5 && mastery < 0.7);

        assert!(env.valid_actions().contains(&b));
        let outcome = env.step(b);
        assert!(outcome.reward < 0.0);
    }

    #[test]
    fn test_curriculum_completion() {
        let mut env = chain_env(6);
        env.reset(Some(0)).unwrap();
        let order = ["a", "b", "c"];

        let mut done = false;
        for name in order {
            let concept = env.graph().index_of(name).unwrap();
            for _ in 0..10 {
                let outcome = env.step(concept);
                done = outcome.done;
                if env.state().is_mastered(concept, 0.7) {
                    break;
                }
            }
        }
        assert!(done);
        assert!(env.state().all_mastered(0.7));
    }

    #[test]
    fn test_goal_directed_termination() {
        let source = parse_knowledge(
            r#"{
                "a": {},
                "b": { "prerequisites": ["a"] },
                "c": { "prerequisites": ["b"] }
            }"#,
        )
        .unwrap();
        let graph = Arc::new(ConceptGraph::from_knowledge(&source).unwrap());
        let mut env = Environment::new(
            graph.clone(),
            LearnerProfile {
                learning_goal: Some("b".to_string()),
                ..Default::default()
            },
            RewardWeights::default(),
            EnvConfig::default(),
            Some(7),
        );
        env.reset(Some(0)).unwrap();

        let a = graph.index_of("a").unwrap();
        let b = graph.index_of("b").unwrap();
        for _ in 0..10 {
            env.step(a);
        }
        let mut done = false;
        for _ in 0..10 {
            done = env.step(b).done;
            if done {
                break;
            }
        }
        // Episode ends at the goal even though "c" is untouched.
        assert!(done);
        assert!(!env.state().all_mastered(0.7));
    }

    #[test]
    fn test_prior_knowledge_seeded_on_reset() {
        let source = parse_knowledge(
            r#"{
                "a": {},
                "b": { "prerequisites": ["a"] }
            }"#,
        )
        .unwrap();
        let graph = Arc::new(ConceptGraph::from_knowledge(&source).unwrap());
        let mut env = Environment::new(
            graph.clone(),
            LearnerProfile {
                prior_knowledge: vec!["a".to_string(), "no-such-concept".to_string()],
                ..Default::default()
            },
            RewardWeights::default(),
            EnvConfig::default(),
            Some(8),
        );
        env.reset(None).unwrap();

        let a = graph.index_of("a").unwrap();
        let b = graph.index_of("b").unwrap();
        assert!(env.state().is_mastered(a, 0.7));
        // "b" opens immediately thanks to the seeded prior knowledge.
        let outcome = env.step(b);
        assert!(outcome.reward > 0.0);
    }
}
