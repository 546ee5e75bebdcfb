//! Skill and plan types.
//!
//! A skill is one learned behavior: a policy model reference plus the
//! metadata needed to execute and validate it. Skills are built from
//! configuration data once at startup and are immutable afterwards. The
//! validation question is data, never hardcoded per call site.

use serde::{Deserialize, Serialize};

/// One learned behavior invocable as a recording episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    /// Skill name, used by the planner to reference it.
    pub name: String,
    /// Reference to the learned policy (path or inference endpoint).
    pub model: String,
    /// Expected execution time of one episode, in seconds.
    pub duration_seconds: f64,
    /// Yes/no question the vision judge answers about the recording.
    pub validation_question: String,
}

impl Skill {
    /// Create a new skill.
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        duration_seconds: f64,
        validation_question: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            duration_seconds,
            validation_question: validation_question.into(),
        }
    }
}

/// An ordered sequence of skills produced by the planner.
///
/// The orchestrator treats a plan as an invariant sequence: skills are never
/// reordered, skipped, or deduplicated, because physical world state carries
/// over between them.
pub type Plan = Vec<Skill>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_new() {
        let skill = Skill::new(
            "stir_spoon",
            "http://localhost:8080/stir_spoon",
            40.0,
            "Was the teacup stirred with the spoon that was inside the teacup?",
        );
        assert_eq!(skill.name, "stir_spoon");
        assert_eq!(skill.duration_seconds, 40.0);
        assert!(skill.validation_question.starts_with("Was the teacup"));
    }

    #[test]
    fn test_skill_serde() {
        let skill = Skill::new("sugar_cube_in_cup", "models/sugar", 60.0, "Was a sugar cube added into the teacup?");
        let yaml = serde_yaml::to_string(&skill).unwrap();
        let back: Skill = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(skill, back);
    }
}
