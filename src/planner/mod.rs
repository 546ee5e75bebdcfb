//! Skill planning: turn a natural-language instruction into an ordered plan.

use async_trait::async_trait;

use crate::domain::{Plan, Skill};
use crate::error::Result;

pub mod gemini;

pub use gemini::GeminiPlanner;

/// External planner ordering the available skills against an instruction.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Return skill names in execution order. Not every instruction step has
    /// a matching skill, and the planner may return names the catalog does
    /// not know; resolution drops those.
    async fn plan(&self, instruction: &str, available: &[String]) -> Result<Vec<String>>;
}

/// Planner returning the available skills in catalog order.
///
/// Used by dry runs: the catalog is assumed to already be in task order, as
/// the original hand-built catalogs were.
pub struct CatalogOrderPlanner;

#[async_trait]
impl Planner for CatalogOrderPlanner {
    async fn plan(&self, _instruction: &str, available: &[String]) -> Result<Vec<String>> {
        Ok(available.to_vec())
    }
}

/// Map planned names back to catalog skills, preserving the planner's order
/// and discarding names the catalog does not know.
pub fn resolve_plan(ordered_names: &[String], catalog: &[Skill]) -> Plan {
    ordered_names
        .iter()
        .flat_map(|name| catalog.iter().filter(move |skill| &skill.name == name))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Skill> {
        vec![
            Skill::new("pick_teabag_drop_in_cup", "m1", 40.0, "q1"),
            Skill::new("remove_teabag_from_cup", "m2", 40.0, "q2"),
            Skill::new("sugar_cube_in_cup", "m3", 60.0, "q3"),
        ]
    }

    #[test]
    fn test_resolve_preserves_planner_order() {
        let names = vec![
            "sugar_cube_in_cup".to_string(),
            "pick_teabag_drop_in_cup".to_string(),
        ];
        let plan = resolve_plan(&names, &catalog());
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].name, "sugar_cube_in_cup");
        assert_eq!(plan[1].name, "pick_teabag_drop_in_cup");
    }

    #[test]
    fn test_resolve_discards_unknown_names() {
        let names = vec![
            "boil_water".to_string(),
            "remove_teabag_from_cup".to_string(),
            "pour_milk".to_string(),
        ];
        let plan = resolve_plan(&names, &catalog());
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].name, "remove_teabag_from_cup");
    }

    #[test]
    fn test_resolve_keeps_duplicates() {
        // A skill the planner schedules twice runs twice; the orchestrator
        // never deduplicates.
        let names = vec![
            "sugar_cube_in_cup".to_string(),
            "sugar_cube_in_cup".to_string(),
        ];
        let plan = resolve_plan(&names, &catalog());
        assert_eq!(plan.len(), 2);
    }

    #[tokio::test]
    async fn test_catalog_order_planner_is_identity() {
        let available = vec!["a".to_string(), "b".to_string()];
        let ordered = CatalogOrderPlanner.plan("make tea", &available).await.unwrap();
        assert_eq!(ordered, available);
    }
}
