//! Bounded-retry-then-escalate execution of one skill.
//!
//! Per skill the state machine is ATTEMPT -> VALIDATE -> {DONE | ATTEMPT |
//! ESCALATE}. An attempt homes the arm, runs the skill session into a fresh
//! per-attempt artifact directory, homes again, then asks the judge. Judged
//! failures are expected and retried; after the attempt budget is exhausted
//! the skill escalates to a human, whose acknowledgment resolves it
//! unconditionally - no re-validation happens after human intervention.
//! Previous attempts' artifacts are preserved for audit.

use std::path::PathBuf;
use std::sync::Arc;

use log::{info, warn};

use crate::control::home::{HomingOptions, is_near_home, return_to_home};
use crate::control::session::{SessionSpec, execute_session};
use crate::domain::{Pose, Skill};
use crate::error::Result;
use crate::events::Events;
use crate::policy::PolicyProvider;
use crate::record::RecorderProvider;
use crate::robot::RobotDriver;
use crate::validation::Judge;

pub mod help;

pub use help::{ConsoleHelp, HelpChannel, SilentHelp};

/// Attempts per skill before escalating to a human.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Outcome of a single validated attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The judge affirmed the skill worked.
    Success,
    /// The judge said no, answered ambiguously, or the judge call errored.
    Failure,
}

/// One try of one skill, terminal once its outcome is known.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionAttempt {
    /// Skill that was attempted.
    pub skill: String,
    /// 1-based attempt index.
    pub attempt: u32,
    /// Judged outcome.
    pub outcome: AttemptOutcome,
    /// Recording handed to the judge; preserved across retries.
    pub artifact: PathBuf,
}

/// How a skill ended up resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum SkillResolution {
    /// The judge affirmed one of the attempts.
    Succeeded { attempts: Vec<ExecutionAttempt> },
    /// Attempts were exhausted and a human completed the skill.
    Escalated { attempts: Vec<ExecutionAttempt> },
}

impl SkillResolution {
    /// Attempts made before the skill resolved.
    pub fn attempts(&self) -> &[ExecutionAttempt] {
        match self {
            Self::Succeeded { attempts } | Self::Escalated { attempts } => attempts,
        }
    }

    /// Whether a human had to step in.
    pub fn escalated(&self) -> bool {
        matches!(self, Self::Escalated { .. })
    }
}

/// Execution parameters shared by every skill.
#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    /// Control frequency for episodes.
    pub fps: u32,
    /// Primary recording episodes per attempt.
    pub episode_count: u32,
    /// Reset-episode duration between recordings, in seconds.
    pub reset_seconds: f64,
    /// Root directory receiving one subdirectory per skill attempt.
    pub artifact_root: PathBuf,
    /// Convergence target between and within skill executions.
    pub home: Pose,
    /// Home controller tuning.
    pub homing: HomingOptions,
    /// Attempts before escalation.
    pub max_attempts: u32,
}

/// Runs one skill through the retry/escalation state machine.
pub struct SkillExecutor<R, J, H>
where
    R: RobotDriver + ?Sized,
    J: Judge,
    H: HelpChannel,
{
    robot: Arc<R>,
    judge: Arc<J>,
    help: Arc<H>,
    policies: Arc<dyn PolicyProvider>,
    recorders: Arc<dyn RecorderProvider>,
    events: Arc<Events>,
    options: ExecutorOptions,
}

impl<R, J, H> SkillExecutor<R, J, H>
where
    R: RobotDriver + ?Sized,
    J: Judge,
    H: HelpChannel,
{
    /// Create an executor over the shared robot handle and collaborators.
    pub fn new(
        robot: Arc<R>,
        judge: Arc<J>,
        help: Arc<H>,
        policies: Arc<dyn PolicyProvider>,
        recorders: Arc<dyn RecorderProvider>,
        events: Arc<Events>,
        options: ExecutorOptions,
    ) -> Self {
        Self {
            robot,
            judge,
            help,
            policies,
            recorders,
            events,
            options,
        }
    }

    /// Run one skill until it resolves by judged success or escalation.
    ///
    /// Fatal errors (configuration mismatches, robot communication failures,
    /// homing timeouts) abort instead of retrying.
    pub async fn run_skill(&self, skill: &Skill) -> Result<SkillResolution> {
        let policy = self.policies.policy_for(skill)?;
        let mut attempts = Vec::new();

        for attempt in 1..=self.options.max_attempts {
            info!("Running skill: {} (try {})", skill.name, attempt);
            self.ensure_home().await?;

            // Tool-and-try-scoped directory; earlier tries stay on disk.
            let attempt_dir = self
                .options
                .artifact_root
                .join(format!("{}_{}", skill.name, attempt - 1));
            let mut recorder = self.recorders.create(&attempt_dir)?;

            self.events.clear_all();
            let spec = SessionSpec {
                fps: self.options.fps,
                episode_count: self.options.episode_count,
                episode_seconds: skill.duration_seconds,
                reset_seconds: self.options.reset_seconds,
                task: &skill.name,
            };
            let artifact = execute_session(
                self.robot.as_ref(),
                &self.events,
                policy.as_ref(),
                recorder.as_mut(),
                &self.options.home,
                &self.options.homing,
                &spec,
                self.help.as_ref(),
            )
            .await?;

            self.ensure_home().await?;

            info!("Analyzing if the skill was used successfully...");
            let success = match self.judge.judge(&artifact, &skill.validation_question).await {
                Ok(verdict) => verdict,
                Err(e) => {
                    warn!("Judge call failed, treating as failure: {}", e);
                    false
                }
            };

            attempts.push(ExecutionAttempt {
                skill: skill.name.clone(),
                attempt,
                outcome: if success {
                    AttemptOutcome::Success
                } else {
                    AttemptOutcome::Failure
                },
                artifact,
            });

            if success {
                return Ok(SkillResolution::Succeeded { attempts });
            }
        }

        self.help
            .alert_and_wait(&format!(
                "Robot had trouble using the skill {}. \
                 Help the robot by executing the skill yourself.",
                skill.name
            ))
            .await?;
        info!("Skill {} resolved by human intervention", skill.name);
        Ok(SkillResolution::Escalated { attempts })
    }

    /// Home pre/post-condition: run the controller only when the arm is not
    /// already settled at home.
    async fn ensure_home(&self) -> Result<()> {
        let observation = self.robot.observe().await?;
        if is_near_home(
            &observation.joints,
            &self.options.home,
            self.options.homing.close_threshold,
        ) {
            return Ok(());
        }
        info!("Returning to home position");
        return_to_home(self.robot.as_ref(), &self.options.home, &self.options.homing).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::HoldPolicyProvider;
    use crate::record::JsonlRecorderProvider;
    use crate::robot::SimRobot;
    use crate::validation::ScriptedJudge;
    use tempfile::tempdir;

    fn pose(values: &[(&str, f64)]) -> Pose {
        values.iter().copied().collect()
    }

    fn executor(
        judge: ScriptedJudge,
        artifact_root: PathBuf,
    ) -> SkillExecutor<SimRobot, ScriptedJudge, SilentHelp> {
        let home = pose(&[("a", 0.0)]);
        SkillExecutor::new(
            Arc::new(SimRobot::new(home.clone())),
            Arc::new(judge),
            Arc::new(SilentHelp),
            Arc::new(HoldPolicyProvider),
            Arc::new(JsonlRecorderProvider::new(50)),
            Events::new(),
            ExecutorOptions {
                fps: 50,
                episode_count: 1,
                reset_seconds: 0.02,
                artifact_root,
                home,
                homing: HomingOptions {
                    settle_interval_ms: 0,
                    ..HomingOptions::default()
                },
                max_attempts: DEFAULT_MAX_ATTEMPTS,
            },
        )
    }

    fn skill() -> Skill {
        Skill::new("stir_spoon", "models/stir", 0.1, "Was the teacup stirred?")
    }

    #[tokio::test]
    async fn test_always_failing_judge_gives_three_attempts_then_escalates() {
        let dir = tempdir().unwrap();
        let exec = executor(ScriptedJudge::new(vec![false, false, false]), dir.path().into());

        let resolution = exec.run_skill(&skill()).await.unwrap();

        assert!(resolution.escalated());
        assert_eq!(resolution.attempts().len(), 3);
        for (i, attempt) in resolution.attempts().iter().enumerate() {
            assert_eq!(attempt.attempt, i as u32 + 1);
            assert_eq!(attempt.outcome, AttemptOutcome::Failure);
        }
    }

    #[tokio::test]
    async fn test_success_on_second_attempt_stops_retrying() {
        let dir = tempdir().unwrap();
        let exec = executor(ScriptedJudge::new(vec![false, true]), dir.path().into());

        let resolution = exec.run_skill(&skill()).await.unwrap();

        assert!(!resolution.escalated());
        assert_eq!(resolution.attempts().len(), 2);
        assert_eq!(resolution.attempts()[1].outcome, AttemptOutcome::Success);
    }

    #[tokio::test]
    async fn test_attempt_artifacts_are_scoped_per_try() {
        let dir = tempdir().unwrap();
        let exec = executor(ScriptedJudge::new(vec![false, false, false]), dir.path().into());

        let resolution = exec.run_skill(&skill()).await.unwrap();

        let dirs: Vec<String> = resolution
            .attempts()
            .iter()
            .map(|a| a.artifact.display().to_string())
            .collect();
        assert!(dirs[0].contains("stir_spoon_0"));
        assert!(dirs[1].contains("stir_spoon_1"));
        assert!(dirs[2].contains("stir_spoon_2"));
    }

    #[tokio::test]
    async fn test_judge_error_counts_as_failure() {
        let dir = tempdir().unwrap();
        let exec = executor(ScriptedJudge::failing_calls(3), dir.path().into());

        let resolution = exec.run_skill(&skill()).await.unwrap();

        assert!(resolution.escalated());
        assert_eq!(resolution.attempts().len(), 3);
    }
}
