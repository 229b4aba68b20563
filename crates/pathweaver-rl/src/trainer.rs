//! Episode/step training loop.
//!
//! Tight and synchronous: no I/O inside the step loop. Snapshot
//! checkpointing happens only at episode boundaries, which are also the only
//! safe points to stop and resume training.
//!
//! Each live step applies one Q-update immediately and, once the replay
//! buffer holds a full batch, one additional update per replayed transition.

use pathweaver_core::PathweaverError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::agent::QLearningAgent;
use crate::env::Environment;
use crate::replay::{ReplayBuffer, Transition};
use crate::snapshot::Snapshot;

fn default_episodes() -> usize {
    1000
}
fn default_max_steps() -> usize {
    100
}
fn default_replay_capacity() -> usize {
    10_000
}
fn default_replay_batch_size() -> usize {
    32
}
fn default_use_replay() -> bool {
    true
}
fn default_log_interval() -> usize {
    100
}

/// Training run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(default = "default_episodes")]
    pub episodes: usize,

    /// Step cap per episode; episodes also end when the curriculum
    /// completes
    #[serde(default = "default_max_steps")]
    pub max_steps_per_episode: usize,

    #[serde(default = "default_replay_capacity")]
    pub replay_capacity: usize,

    #[serde(default = "default_replay_batch_size")]
    pub replay_batch_size: usize,

    /// Replayed mini-batch updates on top of the live online updates
    #[serde(default = "default_use_replay")]
    pub use_replay: bool,

    /// Episodes between progress log lines (0 disables)
    #[serde(default = "default_log_interval")]
    pub log_interval: usize,

    /// Episodes between snapshot checkpoints (0 disables)
    #[serde(default)]
    pub checkpoint_interval: usize,

    /// Where periodic checkpoints are written
    #[serde(default)]
    pub checkpoint_path: Option<String>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: default_episodes(),
            max_steps_per_episode: default_max_steps(),
            replay_capacity: default_replay_capacity(),
            replay_batch_size: default_replay_batch_size(),
            use_replay: default_use_replay(),
            log_interval: default_log_interval(),
            checkpoint_interval: 0,
            checkpoint_path: None,
        }
    }
}

/// Drives the agent against the environment for a configured number of
/// episodes.
pub struct Trainer {
    env: Environment,
    agent: QLearningAgent,
    replay: ReplayBuffer,
    config: TrainingConfig,
    rng: StdRng,
}

impl Trainer {
    pub fn new(
        env: Environment,
        agent: QLearningAgent,
        config: TrainingConfig,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            replay: ReplayBuffer::new(config.replay_capacity),
            env,
            agent,
            config,
            rng,
        }
    }

    /// Runs all configured episodes.
    ///
    /// Returns the cumulative reward of each episode for diagnostics.
    /// Deterministic when the environment, agent and trainer were all
    /// constructed with fixed seeds.
    pub fn train(&mut self) -> Result<Vec<f64>, PathweaverError> {
        let start_time = Instant::now();
        let mut episode_rewards = Vec::with_capacity(self.config.episodes);

        log::info!(
            "Starting training: {} episodes × ≤{} steps ({} concepts, replay {})",
            self.config.episodes,
            self.config.max_steps_per_episode,
            self.env.graph().len(),
            if self.config.use_replay { "on" } else { "off" }
        );

        for episode in 0..self.config.episodes {
            self.env.reset(None)?;
            let mut cumulative = 0.0;

            for _ in 0..self.config.max_steps_per_episode {
                let position = self.env.current_concept();
                let valid = self.env.valid_actions();
                let action = self.agent.select_action(self.env.state(), &valid);

                let outcome = self.env.step(action);
                let transition = Transition {
                    state: position,
                    action,
                    reward: outcome.reward,
                    next_state: self.env.current_concept(),
                    done: outcome.done,
                };

                self.agent.update(&transition);
                self.replay.push(transition);

                if self.config.use_replay && self.replay.len() >= self.config.replay_batch_size {
                    for replayed in self
                        .replay
                        .sample(self.config.replay_batch_size, &mut self.rng)
                    {
                        self.agent.update(&replayed);
                    }
                }

                cumulative += outcome.reward;
                if outcome.done {
                    break;
                }
            }

            self.agent.decay_epsilon();
            episode_rewards.push(cumulative);

            if self.config.log_interval > 0 && (episode + 1) % self.config.log_interval == 0 {
                let window = &episode_rewards[episode + 1 - self.config.log_interval..];
                let avg = window.iter().sum::<f64>() / window.len() as f64;
                log::info!(
                    "Episode {}/{}: avg_reward={:.2}, epsilon={:.3}, time={:.1}s",
                    episode + 1,
                    self.config.episodes,
                    avg,
                    self.agent.epsilon(),
                    start_time.elapsed().as_secs_f64()
                );
            }

            if self.config.checkpoint_interval > 0
                && (episode + 1) % self.config.checkpoint_interval == 0
            {
                if let Some(path) = &self.config.checkpoint_path {
                    let snapshot = Snapshot::capture(&self.agent, self.env.graph());
                    if let Err(e) = snapshot.save_binary(path) {
                        log::warn!("Failed to save checkpoint: {}", e);
                    }
                }
            }
        }

        let total: f64 = episode_rewards.iter().sum();
        log::info!(
            "🏁 Training completed in {:.1}s: avg_reward={:.2}, final epsilon={:.3}",
            start_time.elapsed().as_secs_f64(),
            total / episode_rewards.len().max(1) as f64,
            self.agent.epsilon()
        );

        Ok(episode_rewards)
    }

    pub fn agent(&self) -> &QLearningAgent {
        &self.agent
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Consumes the trainer, handing back the environment and trained agent.
    pub fn into_parts(self) -> (Environment, QLearningAgent) {
        (self.env, self.agent)
    }
}
