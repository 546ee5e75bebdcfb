use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::ArmctlConfig;

use armctl::control::home::return_to_home;
use armctl::escalation::{
    ConsoleHelp, DEFAULT_MAX_ATTEMPTS, ExecutorOptions, SkillExecutor, SkillResolution,
};
use armctl::events::{Events, KeyboardListener};
use armctl::gemini::GeminiClient;
use armctl::orchestrator::{TaskOrchestrator, TaskReport};
use armctl::planner::{CatalogOrderPlanner, GeminiPlanner, Planner, resolve_plan};
use armctl::policy::{HoldPolicyProvider, HttpPolicyProvider};
use armctl::record::JsonlRecorderProvider;
use armctl::robot::{RobotDriver, SimRobot};
use armctl::validation::{ApproveAllJudge, GeminiJudge, Judge};

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("armctl")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("armctl.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let cli = Cli::parse();
    let config = ArmctlConfig::load(cli.config.as_ref())?;
    config.validate()?;

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Run { task, dry_run } => handle_run(task, *dry_run, &config).await,
        Commands::Skill { name, dry_run } => handle_skill(name, *dry_run, &config).await,
        Commands::Home => handle_home(&config).await,
        Commands::Plan { task } => handle_plan(task, &config).await,
    }
}

/// The hardware driver is an external collaborator; the shipped binary
/// drives the simulated arm, starting at the home pose.
fn build_robot(config: &ArmctlConfig) -> SimRobot {
    let robot = SimRobot::new(config.home_pose());
    match config.robot.max_relative_target {
        Some(max_step) => robot.with_max_relative_target(max_step),
        None => robot,
    }
}

fn executor_options(config: &ArmctlConfig) -> ExecutorOptions {
    ExecutorOptions {
        fps: config.control.fps,
        episode_count: config.control.episode_count,
        reset_seconds: config.control.reset_seconds,
        artifact_root: config.artifact_root.clone(),
        home: config.home_pose(),
        homing: config.control.homing.clone(),
        max_attempts: DEFAULT_MAX_ATTEMPTS,
    }
}

fn gemini_client(config: &ArmctlConfig) -> Result<GeminiClient> {
    let api_key = std::env::var(&config.llm.api_key_env)
        .context(format!("{} is not set", config.llm.api_key_env))?;
    Ok(GeminiClient::new(api_key, &config.llm.model)?)
}

async fn handle_run(task: &str, dry_run: bool, config: &ArmctlConfig) -> Result<()> {
    info!("Running task: {} (dry_run: {})", task, dry_run);
    println!("{} {}", "Task:".green(), task);
    let instruction = config.instruction_for(task)?.to_string();

    let robot = Arc::new(build_robot(config));
    robot.connect().await?;
    let events = Events::new();
    let listener = KeyboardListener::spawn(Arc::clone(&events));

    let outcome = if dry_run {
        run_task(
            Arc::clone(&robot),
            Arc::new(ApproveAllJudge),
            CatalogOrderPlanner,
            true,
            &events,
            config,
            &instruction,
        )
        .await
    } else {
        run_task(
            Arc::clone(&robot),
            Arc::new(GeminiJudge::new(gemini_client(config)?)),
            GeminiPlanner::new(gemini_client(config)?),
            false,
            &events,
            config,
            &instruction,
        )
        .await
    };

    listener.shutdown().await;
    robot.disconnect().await?;

    print_report(&outcome?);
    Ok(())
}

async fn run_task<J, P>(
    robot: Arc<SimRobot>,
    judge: Arc<J>,
    planner: P,
    dry_run: bool,
    events: &Arc<Events>,
    config: &ArmctlConfig,
    instruction: &str,
) -> Result<TaskReport>
where
    J: Judge,
    P: Planner,
{
    let policies: Arc<dyn armctl::policy::PolicyProvider> = if dry_run {
        Arc::new(HoldPolicyProvider)
    } else {
        Arc::new(HttpPolicyProvider)
    };
    let executor = SkillExecutor::new(
        robot,
        judge,
        Arc::new(ConsoleHelp::new(Arc::clone(events))),
        policies,
        Arc::new(JsonlRecorderProvider::new(config.control.fps)),
        Arc::clone(events),
        executor_options(config),
    );
    let orchestrator = TaskOrchestrator::new(planner, executor, config.skills.clone());
    Ok(orchestrator.run(instruction).await?)
}

async fn handle_skill(name: &str, dry_run: bool, config: &ArmctlConfig) -> Result<()> {
    let skill = config
        .skills
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| eyre::eyre!("unknown skill '{}'", name))?
        .clone();
    info!("Running single skill: {}", name);
    println!("{} {}", "Skill:".green(), name);

    let robot = Arc::new(build_robot(config));
    robot.connect().await?;
    let events = Events::new();
    let listener = KeyboardListener::spawn(Arc::clone(&events));

    let policies: Arc<dyn armctl::policy::PolicyProvider> = if dry_run {
        Arc::new(HoldPolicyProvider)
    } else {
        Arc::new(HttpPolicyProvider)
    };
    let resolution = if dry_run {
        let executor = SkillExecutor::new(
            Arc::clone(&robot),
            Arc::new(ApproveAllJudge),
            Arc::new(ConsoleHelp::new(Arc::clone(&events))),
            policies,
            Arc::new(JsonlRecorderProvider::new(config.control.fps)),
            Arc::clone(&events),
            executor_options(config),
        );
        executor.run_skill(&skill).await
    } else {
        let executor = SkillExecutor::new(
            Arc::clone(&robot),
            Arc::new(GeminiJudge::new(gemini_client(config)?)),
            Arc::new(ConsoleHelp::new(Arc::clone(&events))),
            policies,
            Arc::new(JsonlRecorderProvider::new(config.control.fps)),
            Arc::clone(&events),
            executor_options(config),
        );
        executor.run_skill(&skill).await
    };

    listener.shutdown().await;
    robot.disconnect().await?;

    match resolution? {
        SkillResolution::Succeeded { attempts } => {
            println!(
                "{} after {} attempt(s)",
                "Succeeded".green(),
                attempts.len()
            );
        }
        SkillResolution::Escalated { attempts } => {
            println!(
                "{} after {} failed attempt(s)",
                "Escalated to human".yellow(),
                attempts.len()
            );
        }
    }
    Ok(())
}

async fn handle_home(config: &ArmctlConfig) -> Result<()> {
    info!("Returning to home position");
    println!("{}", "Returning to home position...".cyan());

    let robot = build_robot(config);
    robot.connect().await?;
    return_to_home(&robot, &config.home_pose(), &config.control.homing).await?;
    robot.disconnect().await?;

    println!("{}", "Home position reached".green());
    Ok(())
}

async fn handle_plan(task: &str, config: &ArmctlConfig) -> Result<()> {
    let instruction = config.instruction_for(task)?;
    let available: Vec<String> = config.skills.iter().map(|s| s.name.clone()).collect();

    let planner = GeminiPlanner::new(gemini_client(config)?);
    let ordered = planner.plan(instruction, &available).await?;
    let plan = resolve_plan(&ordered, &config.skills);

    println!("{} {}", "Plan for".green(), task);
    for (i, skill) in plan.iter().enumerate() {
        println!("  {}. {} ({}s)", i + 1, skill.name, skill.duration_seconds);
    }
    Ok(())
}

fn print_report(report: &TaskReport) {
    println!("{}", "Task complete".green().bold());
    for entry in &report.skills {
        match &entry.resolution {
            SkillResolution::Succeeded { attempts } => {
                println!(
                    "  {} {} ({} attempt(s))",
                    "ok".green(),
                    entry.skill,
                    attempts.len()
                );
            }
            SkillResolution::Escalated { attempts } => {
                println!(
                    "  {} {} ({} failed attempt(s), human completed)",
                    "escalated".yellow(),
                    entry.skill,
                    attempts.len()
                );
            }
        }
    }
}
