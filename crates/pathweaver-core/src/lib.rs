//! # pathweaver-core
//!
//! Core types for the Pathweaver learning-path engine: the concept graph,
//! the knowledge-source model, learner profiles and the error taxonomy.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ pathweaver-core  │  ← graph / knowledge / profile / errors
//! └──────────────────┘
//!          ▲
//!          │
//! ┌────────┴─────────┐
//! │  pathweaver-rl   │  ← environment / rewards / agent / replay / trainer
//! └──────────────────┘
//! ```
//!
//! The knowledge source is consumed read-only: a JSON mapping from concept
//! name to `{difficulty, prerequisites, related_concepts, examples}`.
//! [`ConceptGraph`] turns it into a dense-indexed prerequisite DAG with
//! per-concept difficulty, degree centrality and frontier queries.

pub mod errors;
pub mod graph;
pub mod knowledge;
pub mod profile;

pub use errors::PathweaverError;
pub use graph::{Concept, ConceptGraph};
pub use knowledge::{
    load_knowledge, parse_knowledge, ConceptExample, ConceptSpec, KnowledgeSource,
    DEFAULT_DIFFICULTY,
};
pub use profile::{LearnerLevel, LearnerProfile, LearningStyle};

/// Result type for Pathweaver operations.
pub type Result<T> = std::result::Result<T, PathweaverError>;
