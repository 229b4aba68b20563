//! Learner profile: level, style preference and risk tolerance.
//!
//! The profile is pure input; nothing in the engine mutates it. Its fields
//! feed the reward function (style bonus, prerequisite-penalty scaling) and
//! the environment (prior-knowledge seeding, goal-directed termination).

use serde::{Deserialize, Serialize};

/// Self-assessed learner level, scaling perceived concept difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LearnerLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    /// Unknown level declared by an external caller; no scaling applied.
    #[serde(other)]
    Unspecified,
}

impl LearnerLevel {
    /// Difficulty multiplier for this level.
    ///
    /// More experienced learners perceive the same concept as easier;
    /// an unspecified level leaves the base difficulty unmodified.
    pub fn difficulty_multiplier(&self) -> f64 {
        match self {
            LearnerLevel::Beginner => 1.0,
            LearnerLevel::Intermediate => 0.8,
            LearnerLevel::Advanced => 0.6,
            LearnerLevel::Unspecified => 1.0,
        }
    }
}

/// Preferred learning style, matched against concept example text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningStyle {
    Visual,
    Practical,
    Theoretical,
}

impl LearningStyle {
    /// Keyword vocabulary that categorizes free text into this style.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            LearningStyle::Visual => &[
                "diagram", "visual", "animation", "chart", "picture", "draw", "graph", "plot",
            ],
            LearningStyle::Practical => &[
                "code",
                "hands-on",
                "project",
                "exercise",
                "implement",
                "build",
                "practice",
                "demo",
            ],
            LearningStyle::Theoretical => &[
                "proof",
                "theory",
                "formal",
                "derivation",
                "analysis",
                "abstract",
                "theorem",
            ],
        }
    }

    /// Checks whether the text matches this style's vocabulary.
    pub fn matches_text(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.keywords().iter().any(|kw| lower.contains(kw))
    }
}

fn default_risk_tolerance() -> f64 {
    0.0
}

/// Learner profile consumed by the reward function and environment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LearnerProfile {
    #[serde(default)]
    pub level: LearnerLevel,

    /// Preferred learning style; `None` disables the style bonus.
    #[serde(default)]
    pub learning_style: Option<LearningStyle>,

    /// In [0, 1]. Higher tolerance softens the prerequisite penalty,
    /// modelling learners comfortable with studying ahead of their base.
    #[serde(default = "default_risk_tolerance")]
    pub risk_tolerance: f64,

    /// Concept names the learner already knows; seeded as mastered on reset.
    #[serde(default)]
    pub prior_knowledge: Vec<String>,

    /// Optional goal concept name; once mastered the episode terminates
    /// even if the rest of the curriculum is incomplete.
    #[serde(default)]
    pub learning_goal: Option<String>,
}

impl LearnerProfile {
    /// Risk tolerance clamped to its valid range.
    pub fn clamped_risk_tolerance(&self) -> f64 {
        self.risk_tolerance.clamp(0.0, 1.0)
    }
}
