//! Fixed-rate episode loop.
//!
//! Runs one timed episode: read the observation, compute an action through
//! the policy, send it, record the observation/applied-action pair, then
//! sleep out the remainder of the frame budget. The loop is a cooperative
//! fixed-period scheduler; an iteration that overruns its budget proceeds
//! immediately with no frame drop or catch-up skipping, so the episode just
//! runs slightly over its nominal duration.
//!
//! Termination, in priority order: operator early-exit signal; early-homing
//! convergence once 25% of the duration has elapsed; elapsed time reaching
//! the requested duration.

use std::time::{Duration, Instant};

use log::debug;

use crate::control::home::{HomingOptions, is_near_home, return_to_home};
use crate::domain::Pose;
use crate::error::{ArmctlError, Result};
use crate::events::Events;
use crate::policy::Policy;
use crate::record::{EpisodeResult, Recorder};
use crate::robot::RobotDriver;

/// Fraction of the episode after which the near-home interrupt is armed.
const HOMING_INTERRUPT_FRACTION: f64 = 0.25;

/// Parameters of one episode run.
#[derive(Debug, Clone)]
pub struct EpisodeSpec<'a> {
    /// Target control frequency.
    pub fps: u32,
    /// Nominal episode duration in seconds.
    pub duration_seconds: f64,
    /// Task label passed to the policy and the recorder.
    pub task: &'a str,
}

/// Run one episode.
///
/// With a policy, each iteration commands an action and, with a recorder
/// attached, appends the observation/applied-action pair as one timestep.
/// Without a policy (reset episodes) the loop only paces and watches for
/// interrupts. Zero fps, or a recorder whose declared fps differs from the
/// requested fps, is a configuration error raised before any robot command.
pub async fn run_episode<R>(
    robot: &R,
    events: &Events,
    spec: &EpisodeSpec<'_>,
    policy: Option<&dyn Policy>,
    mut recorder: Option<&mut dyn Recorder>,
    home: &Pose,
    homing: &HomingOptions,
) -> Result<EpisodeResult>
where
    R: RobotDriver + ?Sized,
{
    if spec.fps == 0 {
        return Err(ArmctlError::Configuration(
            "episode loop fps must be > 0".to_string(),
        ));
    }
    if let Some(rec) = recorder.as_deref() {
        if rec.fps() != spec.fps {
            return Err(ArmctlError::Configuration(format!(
                "recorder fps {} != requested loop fps {}",
                rec.fps(),
                spec.fps
            )));
        }
    }

    let period = Duration::from_secs_f64(1.0 / f64::from(spec.fps));
    let interrupt_after = spec.duration_seconds * HOMING_INTERRUPT_FRACTION;
    let episode_start = Instant::now();
    let mut result = EpisodeResult::completed();

    loop {
        let step_start = Instant::now();
        let observation = robot.observe().await?;

        let elapsed = episode_start.elapsed().as_secs_f64();
        if elapsed > interrupt_after
            && is_near_home(&observation.joints, home, homing.near_threshold)
        {
            debug!("Near home after {:.2}s, homing and ending episode", elapsed);
            return_to_home(robot, home, homing).await?;
            result.reached_home = true;
            break;
        }

        if let Some(policy) = policy {
            let values = policy.predict(&observation, spec.task).await?;
            let action = action_from_vector(robot, &values)?;
            // The driver may clip to safety limits; the applied action is
            // what gets recorded.
            let applied = robot.send_action(&action).await?;
            if let Some(rec) = recorder.as_deref_mut() {
                rec.add_frame(&observation, &applied, spec.task)?;
            }
        }

        if let Some(remainder) = period.checked_sub(step_start.elapsed()) {
            tokio::time::sleep(remainder).await;
        }

        if events.take_exit_early() {
            result.early_exit = true;
            break;
        }
        if episode_start.elapsed().as_secs_f64() >= spec.duration_seconds {
            break;
        }
    }

    Ok(result)
}

/// Zip a policy's action vector with the robot's declared action joints.
fn action_from_vector<R>(robot: &R, values: &[f64]) -> Result<Pose>
where
    R: RobotDriver + ?Sized,
{
    let joints = robot.action_joints();
    if joints.len() != values.len() {
        return Err(ArmctlError::Robot(format!(
            "policy returned {} values for {} action joints",
            values.len(),
            joints.len()
        )));
    }
    Ok(joints.into_iter().zip(values.iter().copied()).collect())
}
