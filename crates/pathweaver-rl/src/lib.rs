//! # pathweaver-rl
//!
//! Tabular Q-learning engine for curriculum path planning.
//!
//! The engine learns an ordering in which a learner should study concepts,
//! trained against an environment that models concept mastery under
//! prerequisite constraints.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              Trainer                        │
//! │   episode loop · replay schedule · logs     │
//! └─────────────────────────────────────────────┘
//!        │ select_action / update        │ step / reset
//!        ▼                               ▼
//! ┌──────────────────┐          ┌──────────────────┐
//! │  QLearningAgent  │          │   Environment    │
//! │  N×N Q-table     │          │  LearnerState    │
//! │  ε-greedy        │          │  RewardFunction  │
//! └──────────────────┘          └──────────────────┘
//!        │                               │
//!        │ snapshot                      │ structure
//!        ▼                               ▼
//! ┌──────────────────┐          ┌──────────────────┐
//! │    Snapshot      │          │   ConceptGraph   │
//! │ bincode / JSON   │          │ (pathweaver-core)│
//! └──────────────────┘          └──────────────────┘
//! ```
//!
//! Rewards combine difficulty, prerequisite satisfaction, degree centrality,
//! learning-style affinity, frontier proximity and a terminal-completion
//! bonus; every weight is JSON-configurable. Exploration, replay sampling
//! and start-concept selection all draw from injectable seedable RNGs, so a
//! fully seeded run is reproducible end to end.
//!
//! In-episode violations (invalid action index, unmet prerequisites) are
//! absorbed into the reward signal and never interrupt training; only
//! structural problems (malformed knowledge source, out-of-range start)
//! surface as errors.

pub mod agent;
pub mod env;
pub mod replay;
pub mod rewards;
pub mod snapshot;
pub mod state;
pub mod trainer;

pub use agent::{AgentConfig, AgentConfigBuilder, QLearningAgent};
pub use env::{EnvConfig, Environment, StepOutcome};
pub use replay::{ReplayBuffer, Transition};
pub use rewards::{RewardBreakdown, RewardFunction, RewardWeights};
pub use snapshot::{restore_or_fresh, Snapshot};
pub use state::LearnerState;
pub use trainer::{Trainer, TrainingConfig};

/// Result type for engine operations.
pub type Result<T> = pathweaver_core::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
