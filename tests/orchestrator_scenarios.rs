//! End-to-end task runs over the simulated arm: planning, per-skill retry,
//! and human escalation, observed through a counting help channel.

use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::tempdir;

use armctl::ArmctlError;
use armctl::control::home::HomingOptions;
use armctl::domain::{Pose, Skill};
use armctl::escalation::{DEFAULT_MAX_ATTEMPTS, ExecutorOptions, HelpChannel, SkillExecutor};
use armctl::events::Events;
use armctl::orchestrator::TaskOrchestrator;
use armctl::planner::CatalogOrderPlanner;
use armctl::policy::HoldPolicyProvider;
use armctl::record::JsonlRecorderProvider;
use armctl::robot::SimRobot;
use armctl::validation::ScriptedJudge;

/// Help channel that records every alert instead of blocking on stdin.
struct CountingHelp {
    alerts: AtomicUsize,
    messages: Mutex<Vec<String>>,
}

impl CountingHelp {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            alerts: AtomicUsize::new(0),
            messages: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl HelpChannel for CountingHelp {
    async fn say(&self, _message: &str) {}

    async fn alert_and_wait(&self, message: &str) -> armctl::Result<()> {
        self.alerts.fetch_add(1, Ordering::SeqCst);
        self.messages
            .lock()
            .map_err(|e| ArmctlError::Recording(e.to_string()))?
            .push(message.to_string());
        Ok(())
    }
}

fn home() -> Pose {
    [("a", 0.0), ("b", 1.0)].into_iter().collect()
}

fn catalog() -> Vec<Skill> {
    vec![
        Skill::new("skill_a", "models/a", 0.1, "Did A happen?"),
        Skill::new("skill_b", "models/b", 0.1, "Did B happen?"),
    ]
}

fn options(artifact_root: &Path, fps: u32) -> ExecutorOptions {
    ExecutorOptions {
        fps,
        episode_count: 1,
        reset_seconds: 0.02,
        artifact_root: artifact_root.to_path_buf(),
        home: home(),
        homing: HomingOptions {
            settle_interval_ms: 0,
            ..HomingOptions::default()
        },
        max_attempts: DEFAULT_MAX_ATTEMPTS,
    }
}

#[tokio::test]
async fn test_first_skill_succeeds_second_escalates_after_three_failures() {
    let dir = tempdir().unwrap();
    let robot = Arc::new(SimRobot::new(home()));
    let help = CountingHelp::new();

    // skill_a passes on its first try; every skill_b attempt is rejected.
    let judge = ScriptedJudge::new(vec![true, false, false, false]);
    let executor = SkillExecutor::new(
        Arc::clone(&robot),
        Arc::new(judge),
        Arc::clone(&help),
        Arc::new(HoldPolicyProvider),
        Arc::new(JsonlRecorderProvider::new(50)),
        Events::new(),
        options(dir.path(), 50),
    );
    let orch = TaskOrchestrator::new(CatalogOrderPlanner, executor, catalog());

    let report = orch.run("do A then B").await.unwrap();

    assert_eq!(report.skills.len(), 2);
    assert_eq!(report.skills[0].skill, "skill_a");
    assert!(!report.skills[0].resolution.escalated());
    assert_eq!(report.skills[0].resolution.attempts().len(), 1);

    assert_eq!(report.skills[1].skill, "skill_b");
    assert!(report.skills[1].resolution.escalated());
    assert_eq!(report.skills[1].resolution.attempts().len(), 3);

    assert_eq!(report.escalation_count(), 1);

    // Exactly one human alert, for the skill that ran out of attempts.
    assert_eq!(help.alerts.load(Ordering::SeqCst), 1);
    let messages = help.messages.lock().unwrap();
    assert!(messages[0].contains("skill_b"));
}

#[tokio::test]
async fn test_escalated_skill_does_not_abort_the_rest_of_the_plan() {
    let dir = tempdir().unwrap();
    let robot = Arc::new(SimRobot::new(home()));
    let help = CountingHelp::new();

    // skill_a exhausts its attempts, skill_b then succeeds immediately.
    let judge = ScriptedJudge::new(vec![false, false, false, true]);
    let executor = SkillExecutor::new(
        Arc::clone(&robot),
        Arc::new(judge),
        Arc::clone(&help),
        Arc::new(HoldPolicyProvider),
        Arc::new(JsonlRecorderProvider::new(50)),
        Events::new(),
        options(dir.path(), 50),
    );
    let orch = TaskOrchestrator::new(CatalogOrderPlanner, executor, catalog());

    let report = orch.run("do A then B").await.unwrap();

    assert!(report.skills[0].resolution.escalated());
    assert!(!report.skills[1].resolution.escalated());
    assert_eq!(report.escalation_count(), 1);
    assert_eq!(help.alerts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_recorder_fps_mismatch_aborts_before_any_robot_command() {
    let dir = tempdir().unwrap();
    let robot = Arc::new(SimRobot::new(home()));
    let help = CountingHelp::new();

    // Recorder created at 24 fps while the control loop wants 50.
    let executor = SkillExecutor::new(
        Arc::clone(&robot),
        Arc::new(ScriptedJudge::new(vec![true])),
        Arc::clone(&help),
        Arc::new(HoldPolicyProvider),
        Arc::new(JsonlRecorderProvider::new(24)),
        Events::new(),
        options(dir.path(), 50),
    );
    let orch = TaskOrchestrator::new(CatalogOrderPlanner, executor, catalog());

    let err = orch.run("do A then B").await.unwrap_err();

    assert!(matches!(err, ArmctlError::Configuration(_)));
    assert_eq!(robot.actions_sent(), 0);
    assert_eq!(help.alerts.load(Ordering::SeqCst), 0);
}
