//! Knowledge-source model: the external concept mapping consumed read-only.
//!
//! The concept source is a JSON object mapping concept name to its
//! attributes. Only the mapping itself is structurally required; every
//! per-concept field degrades gracefully when absent:
//!
//! ```json
//! {
//!   "binary search": {
//!     "difficulty": 0.55,
//!     "prerequisites": ["arrays", "recursion"],
//!     "related_concepts": ["sorting"],
//!     "examples": [
//!       { "name": "Guess the number", "description": "Interactive halving demo" }
//!     ]
//!   }
//! }
//! ```

use crate::errors::PathweaverError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Difficulty used when the source omits the field or when a prerequisite
/// name appears without a top-level entry of its own.
pub const DEFAULT_DIFFICULTY: f64 = 0.5;

fn default_difficulty() -> f64 {
    DEFAULT_DIFFICULTY
}

/// A worked example attached to a concept.
///
/// Example text is the evidence used for learning-style categorization, so
/// the description is kept verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConceptExample {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Attributes of a single concept as stored in the knowledge source.
///
/// All fields are optional in the source; absent fields default rather than
/// fail construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptSpec {
    #[serde(default = "default_difficulty")]
    pub difficulty: f64,

    #[serde(default)]
    pub prerequisites: Vec<String>,

    #[serde(default)]
    pub related_concepts: Vec<String>,

    #[serde(default)]
    pub examples: Vec<ConceptExample>,
}

impl Default for ConceptSpec {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            prerequisites: Vec::new(),
            related_concepts: Vec::new(),
            examples: Vec::new(),
        }
    }
}

/// The full knowledge source: concept name -> attributes.
///
/// A `BTreeMap` keeps concept ordering stable, which in turn keeps the dense
/// concept indices assigned by the graph deterministic across runs.
pub type KnowledgeSource = BTreeMap<String, ConceptSpec>;

/// Parses a knowledge source from a JSON string.
///
/// The top-level value must be an object; anything else is a structural
/// defect and fails with [`PathweaverError::Config`].
pub fn parse_knowledge(json: &str) -> Result<KnowledgeSource, PathweaverError> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| PathweaverError::config(format!("knowledge source is not valid JSON: {e}")))?;

    if !value.is_object() {
        return Err(PathweaverError::config(
            "knowledge source must be a JSON object mapping concept names to attributes",
        ));
    }

    serde_json::from_value(value)
        .map_err(|e| PathweaverError::config(format!("malformed concept entry: {e}")))
}

/// Reads and parses a knowledge source file.
pub fn load_knowledge(path: impl AsRef<Path>) -> Result<KnowledgeSource, PathweaverError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)?;
    log::debug!("Loaded knowledge source from {}", path.display());
    parse_knowledge(&json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_fields_default() {
        let source = parse_knowledge(r#"{ "variables": {} }"#).unwrap();
        let spec = &source["variables"];
        assert_eq!(spec.difficulty, DEFAULT_DIFFICULTY);
        assert!(spec.prerequisites.is_empty());
        assert!(spec.examples.is_empty());
    }

    #[test]
    fn test_full_entry() {
        let source = parse_knowledge(
            r#"{
                "binary search": {
                    "difficulty": 0.55,
                    "prerequisites": ["arrays"],
                    "examples": [{ "name": "demo", "description": "halving walkthrough" }]
                }
            }"#,
        )
        .unwrap();
        let spec = &source["binary search"];
        assert_eq!(spec.difficulty, 0.55);
        assert_eq!(spec.prerequisites, vec!["arrays"]);
        assert_eq!(spec.examples[0].name, "demo");
    }

    #[test]
    fn test_non_object_source_fails() {
        let err = parse_knowledge(r#"["not", "a", "mapping"]"#).unwrap_err();
        assert!(matches!(err, PathweaverError::Config(_)));
    }

    #[test]
    fn test_ill_typed_entry_fails() {
        let err = parse_knowledge(r#"{ "loops": { "prerequisites": 42 } }"#).unwrap_err();
        assert!(matches!(err, PathweaverError::Config(_)));
    }
}
