//! Error types for Pathweaver.

use thiserror::Error;

/// Unified error type for all Pathweaver operations.
///
/// Structural problems (malformed knowledge source, out-of-range start
/// concepts) surface as errors. In-episode semantic violations (an invalid
/// action index, an attempt to learn a concept with unmet prerequisites)
/// are deliberately NOT errors: they are absorbed into the reward signal so
/// that training runs are never interrupted by exploration.
#[derive(Error, Debug)]
pub enum PathweaverError {
    /// Malformed concept source data (missing or ill-typed structural fields)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller requested an episode start at a concept outside the graph
    #[error("Invalid start concept {start} (graph holds {num_concepts} concepts)")]
    InvalidStart { start: usize, num_concepts: usize },

    /// Saved snapshot is dimensionally incompatible with the live graph
    #[error("Snapshot mismatch: {0}")]
    SnapshotMismatch(String),

    /// Snapshot encode/decode errors (binary format)
    #[error("Snapshot codec error: {0}")]
    Snapshot(String),

    /// I/O errors (knowledge file reading, snapshot writing)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors (JSON)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PathweaverError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        PathweaverError::Config(message.into())
    }

    /// Creates an invalid-start error.
    pub fn invalid_start(start: usize, num_concepts: usize) -> Self {
        PathweaverError::InvalidStart {
            start,
            num_concepts,
        }
    }

    /// Creates a snapshot-mismatch error.
    pub fn snapshot_mismatch(message: impl Into<String>) -> Self {
        PathweaverError::SnapshotMismatch(message.into())
    }

    /// Creates a snapshot codec error.
    pub fn snapshot(message: impl Into<String>) -> Self {
        PathweaverError::Snapshot(message.into())
    }

    /// Checks if this error is recoverable by falling back to fresh state.
    ///
    /// A snapshot mismatch is recovered by discarding the snapshot and
    /// re-initializing a zeroed table; configuration errors are fatal.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PathweaverError::SnapshotMismatch(_) | PathweaverError::Snapshot(_)
        )
    }
}
