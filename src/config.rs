//! Configuration for armctl.
//!
//! One explicit struct built at startup and passed down; nothing reads the
//! environment at module scope. The skill catalog and the task instruction
//! registry are data here, including each skill's validation question.

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use armctl::control::home::HomingOptions;
use armctl::domain::{Pose, Skill};

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ArmctlConfig {
    /// Robot driver settings.
    pub robot: RobotConfig,

    /// Control loop settings.
    pub control: ControlConfig,

    /// Generative-AI backend settings.
    pub llm: LlmConfig,

    /// Root directory receiving one subdirectory per skill attempt.
    pub artifact_root: PathBuf,

    /// Home pose: the safe/neutral convergence target.
    pub home_pose: BTreeMap<String, f64>,

    /// Skill catalog, in the order a hand-built plan would run them.
    pub skills: Vec<Skill>,

    /// Task name -> natural-language step instruction for the planner.
    pub tasks: BTreeMap<String, String>,
}

/// Robot driver settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RobotConfig {
    /// Serial port of the arm.
    pub port: String,
    /// Driver identifier.
    pub id: String,
    /// Driver-side clip on per-joint command deltas, robot units.
    pub max_relative_target: Option<f64>,
}

/// Control loop settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Episode loop frequency.
    pub fps: u32,
    /// Primary recording episodes per skill attempt.
    pub episode_count: u32,
    /// Reset-episode duration between recordings, in seconds.
    pub reset_seconds: f64,
    /// Home controller tuning.
    pub homing: HomingOptions,
}

/// Generative-AI backend settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model used for planning and judging.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for ArmctlConfig {
    fn default() -> Self {
        Self {
            robot: RobotConfig::default(),
            control: ControlConfig::default(),
            llm: LlmConfig::default(),
            artifact_root: PathBuf::from("recorded_skill_executions"),
            home_pose: default_home_pose(),
            skills: default_skills(),
            tasks: default_tasks(),
        }
    }
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".to_string(),
            id: "so100_follower".to_string(),
            max_relative_target: None,
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            episode_count: 1,
            reset_seconds: 3.0,
            homing: HomingOptions::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: armctl::gemini::DEFAULT_MODEL.to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

fn default_home_pose() -> BTreeMap<String, f64> {
    [
        ("shoulder_pan.pos", -1.8317757009345854),
        ("shoulder_lift.pos", -95.53119730185497),
        ("elbow_flex.pos", 99.45676776822091),
        ("wrist_flex.pos", 42.48962655601659),
        ("wrist_roll.pos", 1.6361416361416303),
        ("gripper.pos", 1.5460295151089247),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn default_skills() -> Vec<Skill> {
    vec![
        Skill::new(
            "pick_teabag_drop_in_cup",
            "models/pick_teabag_drop_in_cup",
            40.0,
            "Was a teabag added into the teacup?",
        ),
        Skill::new(
            "remove_teabag_from_cup",
            "models/remove_teabag_from_cup",
            40.0,
            "Was the teabag removed from the teacup?",
        ),
        Skill::new(
            "sugar_cube_in_cup",
            "models/sugar_cube_in_cup",
            60.0,
            "Was a sugar cube added into the teacup?",
        ),
        Skill::new(
            "stir_spoon",
            "models/stir_spoon",
            40.0,
            "Was the teacup stirred with the spoon that was inside the teacup?",
        ),
    ]
}

fn default_tasks() -> BTreeMap<String, String> {
    let make_tea = "\
Steps for making tea:
1) Boil water
2) Add boiled water into a teacup
3) Add a tea bag into the teacup
4) Remove the tea bag from the teacup
5) Add sugar into the teacup
6) Stir the teacup with a spoon
";
    [("make_tea".to_string(), make_tea.to_string())]
        .into_iter()
        .collect()
}

impl ArmctlConfig {
    /// Load configuration with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. .armctl.yml in current directory
    /// 3. ~/.config/armctl/armctl.yml
    /// 4. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path)
                .context(format!("Failed to load config from {}", path.display()));
        }

        let project_config = PathBuf::from(".armctl.yml");
        if project_config.exists() {
            match Self::load_from_file(&project_config) {
                Ok(config) => {
                    log::info!("Loaded config from .armctl.yml");
                    return Ok(config);
                }
                Err(e) => {
                    log::warn!("Failed to load .armctl.yml: {}", e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("armctl").join("armctl.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", user_config.display());
                        return Ok(config);
                    }
                    Err(e) => {
                        log::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.control.fps == 0 {
            eyre::bail!("control.fps must be > 0");
        }
        if self.control.episode_count == 0 {
            eyre::bail!("control.episode_count must be > 0");
        }
        if self.home_pose.is_empty() {
            eyre::bail!("home_pose must name at least one joint");
        }
        if self.skills.is_empty() {
            eyre::bail!("skills catalog must not be empty");
        }
        for skill in &self.skills {
            if skill.validation_question.is_empty() {
                eyre::bail!("skill '{}' has no validation question", skill.name);
            }
        }
        Ok(())
    }

    /// The home pose as a typed value.
    pub fn home_pose(&self) -> Pose {
        self.home_pose.clone().into()
    }

    /// Instruction text for a named task.
    pub fn instruction_for(&self, task: &str) -> Result<&str> {
        self.tasks
            .get(task)
            .map(String::as_str)
            .ok_or_else(|| eyre::eyre!("unknown task '{}'", task))
    }
}
