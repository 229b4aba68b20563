//! Snapshot persistence for trained agents.
//!
//! One blob holds everything needed to validate and restore a Q-table
//! against a live graph: the table itself, the concept list with
//! difficulties, the prerequisite matrix and the hyperparameters in force
//! when it was trained. Binary (`bincode`) is the primary format; a JSON
//! sidecar can be written for inspection.
//!
//! Restoring against a graph the snapshot was not trained on is a
//! structured failure, not a crash: `validate_against` names the mismatch,
//! and [`restore_or_fresh`] applies the standard recovery of logging a
//! warning and starting from a zeroed table.

use chrono::Utc;
use pathweaver_core::{ConceptGraph, PathweaverError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::agent::{AgentConfig, QLearningAgent};

/// Format version written into every snapshot.
const SNAPSHOT_VERSION: &str = "1.0";

/// A complete trained-agent snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: String,

    /// UTC creation timestamp (RFC 3339)
    pub created_at: String,

    /// Concept names in index order at capture time
    pub concepts: Vec<String>,

    /// Base difficulties in index order
    pub difficulties: Vec<f64>,

    /// Prerequisite matrix (`[concept][prereq]`) at capture time
    pub prerequisites: Vec<Vec<bool>>,

    /// Hyperparameters the table was trained with
    pub agent_config: AgentConfig,

    /// Exploration rate at capture time
    pub epsilon: f64,

    pub episodes_trained: usize,

    /// The learned table: [position][candidate next concept]
    pub q_table: Vec<Vec<f64>>,
}

impl Snapshot {
    /// Captures the agent's learned state together with the graph metadata
    /// needed to validate dimensional compatibility on reload.
    pub fn capture(agent: &QLearningAgent, graph: &ConceptGraph) -> Self {
        Self {
            version: SNAPSHOT_VERSION.to_string(),
            created_at: Utc::now().to_rfc3339(),
            concepts: graph.concepts().iter().map(|c| c.name.clone()).collect(),
            difficulties: graph.concepts().iter().map(|c| c.difficulty).collect(),
            prerequisites: graph.prerequisite_matrix().to_vec(),
            agent_config: agent.config().clone(),
            epsilon: agent.epsilon(),
            episodes_trained: agent.episodes_trained(),
            q_table: agent.q_table().to_vec(),
        }
    }

    /// Saves in compact binary form.
    pub fn save_binary(&self, path: impl AsRef<Path>) -> Result<(), PathweaverError> {
        let path = path.as_ref();
        let data = bincode::serialize(self).map_err(|e| PathweaverError::snapshot(e.to_string()))?;
        let data_len = data.len();
        fs::write(path, data)?;
        log::info!(
            "💾 Snapshot saved to {} (binary, {} bytes, {} episodes)",
            path.display(),
            data_len,
            self.episodes_trained
        );
        Ok(())
    }

    /// Saves a human-readable JSON sidecar.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PathweaverError> {
        let path = path.as_ref();
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        log::info!("Snapshot saved to {} (JSON)", path.display());
        Ok(())
    }

    /// Loads a binary snapshot.
    pub fn load_binary(path: impl AsRef<Path>) -> Result<Self, PathweaverError> {
        let data = fs::read(path.as_ref())?;
        bincode::deserialize(&data).map_err(|e| PathweaverError::snapshot(e.to_string()))
    }

    /// Loads a JSON snapshot.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, PathweaverError> {
        let json = fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&json).map_err(PathweaverError::from)
    }

    /// Checks dimensional compatibility with a live graph.
    ///
    /// The failure reason names the first divergence found so callers can
    /// log something actionable before falling back.
    pub fn validate_against(&self, graph: &ConceptGraph) -> Result<(), PathweaverError> {
        let n = graph.len();
        if self.concepts.len() != n {
            return Err(PathweaverError::snapshot_mismatch(format!(
                "snapshot holds {} concepts, live graph holds {}",
                self.concepts.len(),
                n
            )));
        }
        if self.q_table.len() != n || self.q_table.iter().any(|row| row.len() != n) {
            return Err(PathweaverError::snapshot_mismatch(format!(
                "Q-table dimensions do not match {n} concepts"
            )));
        }
        for (idx, name) in self.concepts.iter().enumerate() {
            if graph.concept(idx).name != *name {
                return Err(PathweaverError::snapshot_mismatch(format!(
                    "concept {idx} is '{}' in the snapshot but '{}' in the live graph",
                    name,
                    graph.concept(idx).name
                )));
            }
        }
        Ok(())
    }

    /// Rebuilds an agent from this snapshot, validating it first.
    pub fn into_agent(
        self,
        graph: &ConceptGraph,
        seed: Option<u64>,
    ) -> Result<QLearningAgent, PathweaverError> {
        self.validate_against(graph)?;
        Ok(QLearningAgent::from_parts(
            self.q_table,
            self.agent_config,
            self.epsilon,
            self.episodes_trained,
            seed,
        ))
    }
}

/// Restores an agent from a binary snapshot, or initializes a fresh one.
///
/// A missing file starts fresh quietly; an unreadable or dimensionally
/// incompatible snapshot is discarded with a warning. Either way the caller
/// gets a usable agent.
pub fn restore_or_fresh(
    path: impl AsRef<Path>,
    graph: &ConceptGraph,
    config: AgentConfig,
    seed: Option<u64>,
) -> QLearningAgent {
    let path = path.as_ref();
    if !path.exists() {
        log::info!(
            "No snapshot at {}; starting with a fresh Q-table",
            path.display()
        );
        return QLearningAgent::new(graph.len(), config, seed);
    }

    match Snapshot::load_binary(path).and_then(|s| s.into_agent(graph, seed)) {
        Ok(agent) => {
            log::info!(
                "📂 Restored snapshot from {} ({} episodes, ε={:.4})",
                path.display(),
                agent.episodes_trained(),
                agent.epsilon()
            );
            agent
        }
        Err(e) => {
            log::warn!(
                "Discarding snapshot at {}: {}; starting with a fresh Q-table",
                path.display(),
                e
            );
            QLearningAgent::new(graph.len(), config, seed)
        }
    }
}
