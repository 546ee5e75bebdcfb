//! Top-level task orchestrator.
//!
//! Obtains an ordered skill plan from the planner, then resolves each skill
//! in turn through the retry/escalation executor. Skills are sequentially
//! dependent - physical world state carries over - so the orchestrator never
//! reorders, skips, or parallelizes them. Fatal errors abort the whole run;
//! otherwise the run ends after the last skill resolves, by judged success
//! or human escalation.

use log::info;

use crate::domain::Skill;
use crate::error::{ArmctlError, Result};
use crate::escalation::{HelpChannel, SkillExecutor, SkillResolution};
use crate::planner::{Planner, resolve_plan};
use crate::robot::RobotDriver;
use crate::validation::Judge;

/// Resolution of one planned skill.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillReport {
    /// Skill name.
    pub skill: String,
    /// How it resolved.
    pub resolution: SkillResolution,
}

/// Outcome of a whole task run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskReport {
    /// Per-skill resolutions, in plan order.
    pub skills: Vec<SkillReport>,
}

impl TaskReport {
    /// Number of skills that needed human intervention.
    pub fn escalation_count(&self) -> usize {
        self.skills.iter().filter(|s| s.resolution.escalated()).count()
    }
}

/// Drives a full task: plan, then execute skill by skill.
pub struct TaskOrchestrator<R, J, H, P>
where
    R: RobotDriver + ?Sized,
    J: Judge,
    H: HelpChannel,
    P: Planner,
{
    planner: P,
    executor: SkillExecutor<R, J, H>,
    catalog: Vec<Skill>,
}

impl<R, J, H, P> TaskOrchestrator<R, J, H, P>
where
    R: RobotDriver + ?Sized,
    J: Judge,
    H: HelpChannel,
    P: Planner,
{
    /// Create an orchestrator over a skill catalog.
    pub fn new(planner: P, executor: SkillExecutor<R, J, H>, catalog: Vec<Skill>) -> Self {
        Self {
            planner,
            executor,
            catalog,
        }
    }

    /// Plan the task without executing it.
    pub async fn plan(&self, instruction: &str) -> Result<Vec<Skill>> {
        let available: Vec<String> = self.catalog.iter().map(|s| s.name.clone()).collect();
        let ordered = self.planner.plan(instruction, &available).await?;
        info!("Planned skill order: {:?}", ordered);
        let plan = resolve_plan(&ordered, &self.catalog);
        if plan.is_empty() {
            return Err(ArmctlError::Llm(
                "planner produced no executable skills".to_string(),
            ));
        }
        Ok(plan)
    }

    /// Run the whole task.
    pub async fn run(&self, instruction: &str) -> Result<TaskReport> {
        let plan = self.plan(instruction).await?;

        let mut report = TaskReport::default();
        for skill in &plan {
            let resolution = self.executor.run_skill(skill).await?;
            report.skills.push(SkillReport {
                skill: skill.name.clone(),
                resolution,
            });
        }
        info!(
            "Task finished: {} skills, {} escalations",
            report.skills.len(),
            report.escalation_count()
        );
        Ok(report)
    }
}
