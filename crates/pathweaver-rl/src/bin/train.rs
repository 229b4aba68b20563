//! Q-table training for concept curricula.
//!
//! Trains a learning-path agent against a knowledge-source JSON file and
//! writes the resulting snapshot for downstream path queries.

use anyhow::{Context, Result};
use pathweaver_core::{ConceptGraph, LearnerProfile};
use pathweaver_rl::{
    AgentConfig, EnvConfig, Environment, QLearningAgent, RewardWeights, Snapshot, Trainer,
    TrainingConfig,
};
use std::sync::Arc;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 4 {
        eprintln!("Usage: {} <knowledge.json> <episodes> <output.bin>", args[0]);
        eprintln!(
            "Example: {} data/cs_knowledge.json 1000 snapshots/cs_agent.bin",
            args[0]
        );
        std::process::exit(1);
    }

    let knowledge_path = &args[1];
    let episodes: usize = args[2].parse().context("episodes must be an integer")?;
    let output_path = &args[3];

    // Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    log::info!("Pathweaver Q-table training");
    log::info!("  Knowledge: {}", knowledge_path);
    log::info!("  Episodes: {}", episodes);
    log::info!("  Output: {}", output_path);

    // Load the concept graph
    let graph = Arc::new(
        ConceptGraph::from_file(knowledge_path)
            .with_context(|| format!("Failed to load knowledge source {knowledge_path}"))?,
    );
    log::info!(
        "Loaded graph: {} concepts, {} prerequisite edges, {} root(s)",
        graph.len(),
        graph.num_edges(),
        graph.roots().len()
    );

    let cyclic = graph.cyclic_concepts();
    if !cyclic.is_empty() {
        log::warn!(
            "{} concept(s) are trapped in prerequisite cycles and will never be recommended",
            cyclic.len()
        );
    }

    // Assemble environment, agent and trainer with training-focused defaults
    let profile = LearnerProfile::default();
    let env = Environment::new(
        graph.clone(),
        profile,
        RewardWeights::default(),
        EnvConfig::default(),
        None,
    );
    let agent = QLearningAgent::new(graph.len(), AgentConfig::default(), None);
    let config = TrainingConfig {
        episodes,
        ..Default::default()
    };

    let mut trainer = Trainer::new(env, agent, config, None);
    let rewards = trainer.train()?;

    if let Some(last) = rewards.last() {
        let window = &rewards[rewards.len().saturating_sub(100)..];
        let avg: f64 = window.iter().sum::<f64>() / window.len() as f64;
        log::info!(
            "Final episode reward: {:.2} (avg of last {}: {:.2})",
            last,
            window.len(),
            avg
        );
    }

    let (_, agent) = trainer.into_parts();

    // Save snapshot: binary for reload, JSON sidecar for inspection
    let snapshot = Snapshot::capture(&agent, &graph);
    snapshot
        .save_binary(output_path)
        .context("Failed to save binary snapshot")?;
    let json_path = if output_path.ends_with(".bin") {
        output_path.replace(".bin", ".json")
    } else {
        format!("{output_path}.json")
    };
    snapshot
        .save_json(&json_path)
        .context("Failed to save JSON snapshot")?;

    // Show the learned traversal from each entry point
    for root in graph.roots() {
        let path = agent.get_optimal_path(&graph, root)?;
        let names: Vec<&str> = path.iter().map(|&c| graph.concept(c).name.as_str()).collect();
        log::info!(
            "Recommended order from '{}': {}",
            graph.concept(root).name,
            names.join(" → ")
        );
    }

    Ok(())
}
