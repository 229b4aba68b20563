//! Tabular Q-learning agent over the concept graph.
//!
//! The Q-table is dense: one row per position (current concept), one column
//! per candidate next concept. An entry reads as "expected discounted future
//! reward of studying this concept next from here".
//!
//! ## Q-Learning Update
//!
//! ```text
//! Q(s, a) ← Q(s, a) + α * [r + γ * max_a' Q(s', a') * (1 - done) - Q(s, a)]
//! ```
//!
//! `done` zeroes the bootstrap term; there is no reward beyond the end of an
//! episode. Exploration is epsilon-greedy over the environment's valid
//! actions, with epsilon decaying geometrically at episode boundaries down
//! to a fixed floor.

use pathweaver_core::{ConceptGraph, PathweaverError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::replay::Transition;
use crate::state::LearnerState;

fn default_alpha() -> f64 {
    0.1
}
fn default_gamma() -> f64 {
    0.95
}
fn default_epsilon() -> f64 {
    1.0
}
fn default_epsilon_decay() -> f64 {
    0.995
}
fn default_epsilon_min() -> f64 {
    0.05
}

/// Q-learning hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Learning rate (alpha)
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Discount factor (gamma)
    #[serde(default = "default_gamma")]
    pub gamma: f64,

    /// Initial exploration rate
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// Geometric decay applied after each episode
    #[serde(default = "default_epsilon_decay")]
    pub epsilon_decay: f64,

    /// Exploration floor; decay never goes below this
    #[serde(default = "default_epsilon_min")]
    pub epsilon_min: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            gamma: default_gamma(),
            epsilon: default_epsilon(),
            epsilon_decay: default_epsilon_decay(),
            epsilon_min: default_epsilon_min(),
        }
    }
}

impl AgentConfig {
    /// Creates a builder for agent configuration.
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Default)]
pub struct AgentConfigBuilder {
    config: AgentConfig,
}

impl AgentConfigBuilder {
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.config.alpha = alpha;
        self
    }

    pub fn gamma(mut self, gamma: f64) -> Self {
        self.config.gamma = gamma;
        self
    }

    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    pub fn epsilon_decay(mut self, decay: f64) -> Self {
        self.config.epsilon_decay = decay;
        self
    }

    pub fn epsilon_min(mut self, min: f64) -> Self {
        self.config.epsilon_min = min;
        self
    }

    pub fn build(self) -> AgentConfig {
        self.config
    }
}

/// Epsilon-greedy tabular Q-learning agent.
pub struct QLearningAgent {
    config: AgentConfig,

    /// Dense table: [position][candidate next concept] -> Q-value
    q_table: Vec<Vec<f64>>,

    /// Current exploration rate (decays over episodes)
    epsilon: f64,

    episodes_trained: usize,

    rng: StdRng,
}

impl QLearningAgent {
    /// Fresh agent with a zeroed Q-table.
    pub fn new(num_concepts: usize, config: AgentConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            epsilon: config.epsilon,
            q_table: vec![vec![0.0; num_concepts]; num_concepts],
            episodes_trained: 0,
            config,
            rng,
        }
    }

    /// Rebuilds an agent around a previously learned table.
    pub(crate) fn from_parts(
        q_table: Vec<Vec<f64>>,
        config: AgentConfig,
        epsilon: f64,
        episodes_trained: usize,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            epsilon: epsilon.max(config.epsilon_min),
            q_table,
            episodes_trained,
            config,
            rng,
        }
    }

    /// Selects an action with epsilon-greedy exploration.
    ///
    /// With probability epsilon a uniform choice among `valid_actions`;
    /// otherwise the argmax of the current Q-table row restricted to them.
    /// When no action is valid (every remaining concept is locked, which
    /// only happens on cyclic prerequisite data) the fallback is the
    /// concept with the highest existing mastery; the episode is effectively
    /// stuck and will end at the step cap.
    pub fn select_action(&mut self, state: &LearnerState, valid_actions: &[usize]) -> usize {
        if valid_actions.is_empty() {
            return Self::argmax(state.mastery_vector(), 0..state.len());
        }

        if self.rng.gen::<f64>() < self.epsilon {
            return valid_actions[self.rng.gen_range(0..valid_actions.len())];
        }

        let row = &self.q_table[state.current_concept()];
        Self::argmax(row, valid_actions.iter().copied())
    }

    /// Applies the one-step Q-learning update for a transition.
    pub fn update(&mut self, transition: &Transition) {
        let Transition {
            state,
            action,
            reward,
            next_state,
            done,
        } = *transition;

        let bootstrap = if done {
            0.0
        } else {
            self.max_q(next_state)
        };

        let current = self.q_table[state][action];
        self.q_table[state][action] =
            current + self.config.alpha * (reward + self.config.gamma * bootstrap - current);
    }

    /// Decays epsilon after an episode: `ε ← max(ε_min, ε * decay)`.
    pub fn decay_epsilon(&mut self) {
        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);
        self.episodes_trained += 1;
        log::debug!(
            "Episode {}: epsilon decayed to {:.4}",
            self.episodes_trained,
            self.epsilon
        );
    }

    /// Greedy traversal of the whole curriculum from `start`.
    ///
    /// Deterministic given a fixed Q-table: no exploration, ties broken
    /// toward the lowest concept index. A visited set prevents cycles: when
    /// the greedy choice would revisit a concept, the first not-yet-visited
    /// valid action substitutes. Stops when no valid unvisited action
    /// remains or all concepts are visited; the result never exceeds N
    /// entries.
    pub fn get_optimal_path(
        &self,
        graph: &ConceptGraph,
        start: usize,
    ) -> Result<Vec<usize>, PathweaverError> {
        self.rollout(graph, start, None)
    }

    /// Greedy traversal that stops once `goal` has been visited.
    pub fn path_to_goal(
        &self,
        graph: &ConceptGraph,
        start: usize,
        goal: usize,
    ) -> Result<Vec<usize>, PathweaverError> {
        if goal >= graph.len() {
            return Err(PathweaverError::invalid_start(goal, graph.len()));
        }
        self.rollout(graph, start, Some(goal))
    }

    fn rollout(
        &self,
        graph: &ConceptGraph,
        start: usize,
        goal: Option<usize>,
    ) -> Result<Vec<usize>, PathweaverError> {
        let n = graph.len();
        if start >= n {
            return Err(PathweaverError::invalid_start(start, n));
        }

        let mut path = vec![start];
        let mut visited = BTreeSet::from([start]);
        let mut current = start;

        while path.len() < n {
            if goal.is_some_and(|g| visited.contains(&g)) {
                break;
            }

            // Visited concepts stand in for the mastered set here, keeping
            // the rollout independent of any live environment.
            let valid: Vec<usize> = (0..n)
                .filter(|&c| {
                    graph
                        .prerequisites_of(c)
                        .iter()
                        .all(|p| visited.contains(p))
                })
                .collect();

            let greedy = Self::argmax(&self.q_table[current], valid.iter().copied());
            let choice = if !visited.contains(&greedy) && valid.contains(&greedy) {
                Some(greedy)
            } else {
                // Greedy pick would revisit: substitute the first unvisited
                // valid action instead.
                valid.iter().copied().find(|c| !visited.contains(c))
            };

            match choice {
                Some(next) => {
                    path.push(next);
                    visited.insert(next);
                    current = next;
                }
                None => break,
            }
        }

        Ok(path)
    }

    /// Index with the highest value among `candidates`; first wins on ties.
    fn argmax(values: &[f64], candidates: impl IntoIterator<Item = usize>) -> usize {
        let mut best_idx = 0;
        let mut best_value = f64::NEG_INFINITY;
        for idx in candidates {
            if values[idx] > best_value {
                best_value = values[idx];
                best_idx = idx;
            }
        }
        best_idx
    }

    fn max_q(&self, state: usize) -> f64 {
        self.q_table[state]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn episodes_trained(&self) -> usize {
        self.episodes_trained
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn num_concepts(&self) -> usize {
        self.q_table.len()
    }

    pub fn q_table(&self) -> &[Vec<f64>] {
        &self.q_table
    }

    pub fn q_value(&self, state: usize, action: usize) -> f64 {
        self.q_table[state][action]
    }
}
