//! Concept graph: the authoritative prerequisite structure.
//!
//! Concepts receive dense indices `0..N-1` in source order (the knowledge
//! source is an ordered map, so indices are deterministic). The directed
//! prerequisite relation is held twice: as an N×N boolean matrix for O(1)
//! membership checks and as forward/backward adjacency lists for iteration.
//!
//! The relation is expected to be acyclic. A cycle does not fail
//! construction (it is a property of the source data), but every concept
//! trapped in one is unreachable by any terminating traversal, so the
//! residue is computed eagerly and reported at warn level.

use crate::errors::PathweaverError;
use crate::knowledge::{ConceptExample, KnowledgeSource, DEFAULT_DIFFICULTY};
use crate::profile::LearnerLevel;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// A single concept with its loaded attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concept {
    /// Display name, exactly as keyed in the knowledge source
    pub name: String,

    /// Base difficulty before learner-level scaling
    pub difficulty: f64,

    /// Worked examples carrying learning-style evidence
    pub examples: Vec<ConceptExample>,

    /// Related concept names (metadata only, no edge semantics)
    pub related_concepts: Vec<String>,
}

/// Directed concept-prerequisite graph with per-concept difficulty.
///
/// Immutable after construction; safe to share read-only between an
/// environment and a reward function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptGraph {
    concepts: Vec<Concept>,

    /// `prereq_matrix[concept][prereq]` is true when `prereq` must be
    /// mastered before `concept` becomes eligible
    prereq_matrix: Vec<Vec<bool>>,

    /// Direct predecessors (prerequisites) per concept
    predecessors: Vec<Vec<usize>>,

    /// Direct successors (dependents) per concept
    successors: Vec<Vec<usize>>,

    num_edges: usize,
}

impl ConceptGraph {
    /// Builds the graph from a parsed knowledge source.
    ///
    /// Prerequisite names without a top-level entry of their own are
    /// materialized as default-difficulty concepts, matching the permissive
    /// behavior of common graph libraries when an edge names a new node.
    pub fn from_knowledge(source: &KnowledgeSource) -> Result<Self, PathweaverError> {
        if source.is_empty() {
            return Err(PathweaverError::config(
                "knowledge source contains no concepts",
            ));
        }

        // Assign indices: named entries first (source order), then any
        // prerequisite-only names in first-mention order.
        let mut index: HashMap<String, usize> = HashMap::new();
        for name in source.keys() {
            let next = index.len();
            index.insert(name.clone(), next);
        }
        for spec in source.values() {
            for prereq in &spec.prerequisites {
                if !index.contains_key(prereq) {
                    log::debug!(
                        "Prerequisite '{}' has no entry of its own; adding with default difficulty",
                        prereq
                    );
                    index.insert(prereq.clone(), index.len());
                }
            }
        }

        let n = index.len();
        let mut concepts: Vec<Concept> = (0..n)
            .map(|_| Concept {
                name: String::new(),
                difficulty: DEFAULT_DIFFICULTY,
                examples: Vec::new(),
                related_concepts: Vec::new(),
            })
            .collect();
        for (name, &idx) in &index {
            concepts[idx].name = name.clone();
        }
        for (name, spec) in source {
            let idx = index[name];
            concepts[idx].difficulty = spec.difficulty;
            concepts[idx].examples = spec.examples.clone();
            concepts[idx].related_concepts = spec.related_concepts.clone();
        }

        let mut graph = Self {
            concepts,
            prereq_matrix: vec![vec![false; n]; n],
            predecessors: vec![Vec::new(); n],
            successors: vec![Vec::new(); n],
            num_edges: 0,
        };

        for (name, spec) in source {
            let concept = index[name];
            for prereq_name in &spec.prerequisites {
                let prereq = index[prereq_name];
                graph.add_prerequisite(concept, prereq);
            }
        }

        let cyclic = graph.cyclic_concepts();
        if !cyclic.is_empty() {
            log::warn!(
                "Prerequisite relation contains cycles; {} concept(s) can never become eligible: {:?}",
                cyclic.len(),
                cyclic
                    .iter()
                    .map(|&c| graph.concepts[c].name.as_str())
                    .collect::<Vec<_>>()
            );
        }

        log::info!(
            "Concept graph built: {} concepts, {} prerequisite edges, {} root(s)",
            graph.len(),
            graph.num_edges,
            graph.roots().len()
        );

        Ok(graph)
    }

    /// Loads the knowledge source file and builds the graph.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PathweaverError> {
        let source = crate::knowledge::load_knowledge(path)?;
        Self::from_knowledge(&source)
    }

    /// Generates a random layered DAG for tests and demos.
    ///
    /// Difficulties are drawn uniformly from [0.3, 0.8]. Edges only point
    /// from lower to higher indices, so the result is always acyclic.
    pub fn random(n: usize, edge_prob: f64, rng: &mut impl Rng) -> Self {
        let concepts = (0..n)
            .map(|i| Concept {
                name: format!("concept-{i}"),
                difficulty: rng.gen_range(0.3..=0.8),
                examples: Vec::new(),
                related_concepts: Vec::new(),
            })
            .collect();

        let mut graph = Self {
            concepts,
            prereq_matrix: vec![vec![false; n]; n],
            predecessors: vec![Vec::new(); n],
            successors: vec![Vec::new(); n],
            num_edges: 0,
        };

        for concept in 1..n {
            for prereq in 0..concept {
                if rng.gen_bool(edge_prob) {
                    graph.add_prerequisite(concept, prereq);
                }
            }
        }

        graph
    }

    fn add_prerequisite(&mut self, concept: usize, prereq: usize) {
        if self.prereq_matrix[concept][prereq] {
            return; // duplicate edge in source
        }
        self.prereq_matrix[concept][prereq] = true;
        self.predecessors[concept].push(prereq);
        self.successors[prereq].push(concept);
        self.num_edges += 1;
    }

    /// Number of concepts.
    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    /// True when the graph holds no concepts.
    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// Number of prerequisite edges.
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// The concept at `index`.
    pub fn concept(&self, index: usize) -> &Concept {
        &self.concepts[index]
    }

    /// All concepts in index order.
    pub fn concepts(&self) -> &[Concept] {
        &self.concepts
    }

    /// Index of a concept by display name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.concepts.iter().position(|c| c.name == name)
    }

    /// Direct prerequisites of a concept.
    pub fn prerequisites_of(&self, concept: usize) -> &[usize] {
        &self.predecessors[concept]
    }

    /// Direct dependents of a concept.
    pub fn dependents_of(&self, concept: usize) -> &[usize] {
        &self.successors[concept]
    }

    /// True when `prereq` is a direct prerequisite of `concept`.
    pub fn requires(&self, concept: usize, prereq: usize) -> bool {
        self.prereq_matrix[concept][prereq]
    }

    /// The raw prerequisite matrix (`[concept][prereq]`).
    pub fn prerequisite_matrix(&self) -> &[Vec<bool>] {
        &self.prereq_matrix
    }

    /// Number of concepts this concept unlocks (out-degree).
    pub fn out_degree(&self, concept: usize) -> usize {
        self.successors[concept].len()
    }

    /// Difficulty scaled for the learner level.
    ///
    /// Unknown levels fall back to the base value unmodified.
    pub fn difficulty(&self, concept: usize, level: LearnerLevel) -> f64 {
        self.concepts[concept].difficulty * level.difficulty_multiplier()
    }

    /// Normalized degree centrality in [0, 1].
    ///
    /// Total degree (in + out) over the maximum possible directed degree
    /// `2(N-1)`. Well-connected concepts score higher independent of topic.
    pub fn centrality(&self, concept: usize) -> f64 {
        let n = self.len();
        if n <= 1 {
            return 0.0;
        }
        let degree = self.predecessors[concept].len() + self.successors[concept].len();
        degree as f64 / (2 * (n - 1)) as f64
    }

    /// Concepts with no prerequisites, the valid episode entry points.
    pub fn roots(&self) -> Vec<usize> {
        (0..self.len())
            .filter(|&c| self.predecessors[c].is_empty())
            .collect()
    }

    /// The knowledge frontier: concepts one hop beyond the mastered set
    /// whose prerequisites are all mastered, excluding concepts already
    /// mastered themselves.
    ///
    /// Always recomputed from the mastered set passed in; never cached,
    /// since eligibility shifts every time mastery changes.
    pub fn frontier(&self, mastered: &BTreeSet<usize>) -> BTreeSet<usize> {
        let mut frontier = BTreeSet::new();
        for &concept in mastered {
            for &dependent in &self.successors[concept] {
                if mastered.contains(&dependent) {
                    continue;
                }
                if self.predecessors[dependent]
                    .iter()
                    .all(|p| mastered.contains(p))
                {
                    frontier.insert(dependent);
                }
            }
        }
        frontier
    }

    /// Concepts trapped in prerequisite cycles.
    ///
    /// Kahn's algorithm: repeatedly peel concepts whose prerequisites have
    /// all been peeled; whatever remains sits on or behind a cycle and can
    /// never become eligible.
    pub fn cyclic_concepts(&self) -> Vec<usize> {
        let n = self.len();
        let mut remaining_prereqs: Vec<usize> =
            (0..n).map(|c| self.predecessors[c].len()).collect();
        let mut queue: Vec<usize> = (0..n).filter(|&c| remaining_prereqs[c] == 0).collect();
        let mut peeled = vec![false; n];

        while let Some(concept) = queue.pop() {
            peeled[concept] = true;
            for &dependent in &self.successors[concept] {
                remaining_prereqs[dependent] -= 1;
                if remaining_prereqs[dependent] == 0 {
                    queue.push(dependent);
                }
            }
        }

        (0..n).filter(|&c| !peeled[c]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::parse_knowledge;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn chain_source() -> KnowledgeSource {
        parse_knowledge(
            r#"{
                "a-variables": { "difficulty": 0.3 },
                "b-loops": { "difficulty": 0.4, "prerequisites": ["a-variables"] },
                "c-recursion": { "difficulty": 0.7, "prerequisites": ["b-loops"] }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_chain_structure() {
        let graph = ConceptGraph::from_knowledge(&chain_source()).unwrap();
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.num_edges(), 2);

        let b = graph.index_of("b-loops").unwrap();
        let a = graph.index_of("a-variables").unwrap();
        assert_eq!(graph.prerequisites_of(b), &[a]);
        assert_eq!(graph.dependents_of(a), &[b]);
        assert_eq!(graph.roots(), vec![a]);
    }

    #[test]
    fn test_empty_source_is_config_error() {
        let err = ConceptGraph::from_knowledge(&KnowledgeSource::new()).unwrap_err();
        assert!(matches!(err, PathweaverError::Config(_)));
    }

    #[test]
    fn test_unlisted_prerequisite_materialized() {
        let source = parse_knowledge(
            r#"{ "sorting": { "prerequisites": ["arrays"] } }"#,
        )
        .unwrap();
        let graph = ConceptGraph::from_knowledge(&source).unwrap();
        assert_eq!(graph.len(), 2);
        let arrays = graph.index_of("arrays").unwrap();
        assert_eq!(graph.concept(arrays).difficulty, DEFAULT_DIFFICULTY);
        assert!(graph.prerequisites_of(arrays).is_empty());
    }

    #[test]
    fn test_difficulty_scaling() {
        let graph = ConceptGraph::from_knowledge(&chain_source()).unwrap();
        let c = graph.index_of("c-recursion").unwrap();
        assert!((graph.difficulty(c, LearnerLevel::Beginner) - 0.7).abs() < 1e-12);
        assert!((graph.difficulty(c, LearnerLevel::Intermediate) - 0.56).abs() < 1e-12);
        assert!((graph.difficulty(c, LearnerLevel::Advanced) - 0.42).abs() < 1e-12);
        assert!((graph.difficulty(c, LearnerLevel::Unspecified) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_centrality_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let graph = ConceptGraph::random(12, 0.4, &mut rng);
        for c in 0..graph.len() {
            let centrality = graph.centrality(c);
            assert!((0.0..=1.0).contains(&centrality), "centrality {centrality}");
        }
        // Middle of a chain is better connected than its endpoints.
        let chain = ConceptGraph::from_knowledge(&chain_source()).unwrap();
        let a = chain.index_of("a-variables").unwrap();
        let b = chain.index_of("b-loops").unwrap();
        assert!(chain.centrality(b) > chain.centrality(a) - 1e-12);
    }

    #[test]
    fn test_frontier_tracks_mastery() {
        let graph = ConceptGraph::from_knowledge(&chain_source()).unwrap();
        let a = graph.index_of("a-variables").unwrap();
        let b = graph.index_of("b-loops").unwrap();
        let c = graph.index_of("c-recursion").unwrap();

        let mut mastered = BTreeSet::new();
        assert!(graph.frontier(&mastered).is_empty());

        mastered.insert(a);
        assert_eq!(graph.frontier(&mastered), BTreeSet::from([b]));

        mastered.insert(b);
        assert_eq!(graph.frontier(&mastered), BTreeSet::from([c]));

        mastered.insert(c);
        assert!(graph.frontier(&mastered).is_empty());
    }

    #[test]
    fn test_cycle_detection() {
        let source = parse_knowledge(
            r#"{
                "x": { "prerequisites": ["y"] },
                "y": { "prerequisites": ["x"] },
                "z": {}
            }"#,
        )
        .unwrap();
        let graph = ConceptGraph::from_knowledge(&source).unwrap();
        let mut cyclic = graph.cyclic_concepts();
        cyclic.sort_unstable();
        let x = graph.index_of("x").unwrap();
        let y = graph.index_of("y").unwrap();
        let mut expected = vec![x, y];
        expected.sort_unstable();
        assert_eq!(cyclic, expected);

        let acyclic = ConceptGraph::from_knowledge(&chain_source()).unwrap();
        assert!(acyclic.cyclic_concepts().is_empty());
    }

    #[test]
    fn test_random_graph_is_acyclic() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let graph = ConceptGraph::random(20, 0.3, &mut rng);
        assert!(graph.cyclic_concepts().is_empty());
        for c in 0..graph.len() {
            assert!((0.3..=0.8).contains(&graph.concept(c).difficulty));
        }
    }
}
