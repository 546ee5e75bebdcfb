//! Closed-loop home controller.
//!
//! A per-joint saturated proportional controller: each step moves every joint
//! at most `step_size` toward the home pose, and commands a joint directly to
//! its target once it is within `close_threshold`. The pose is reached only
//! when all joints settle in the same step. Velocity is bounded and
//! convergence is monotonic, assuming the actuator tracks commanded positions
//! within one tick; no overshoot compensation is modeled.

use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::domain::Pose;
use crate::error::{ArmctlError, Result};
use crate::robot::RobotDriver;

/// Tuning for the home controller and the episode loop's homing interrupt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomingOptions {
    /// Largest per-joint move commanded in one step.
    pub step_size: f64,
    /// Per-joint distance below which a joint is commanded straight to target.
    pub close_threshold: f64,
    /// Looser per-joint distance used to decide whether homing is worth
    /// attempting at all (the episode loop's "near home" check).
    pub near_threshold: f64,
    /// Pause between controller steps, in milliseconds.
    pub settle_interval_ms: u64,
    /// Iteration budget before homing is declared a fatal timeout.
    pub max_iterations: u32,
}

impl Default for HomingOptions {
    fn default() -> Self {
        Self {
            step_size: 1.6,
            close_threshold: 1.0,
            near_threshold: 9.0,
            settle_interval_ms: 50,
            max_iterations: 2000,
        }
    }
}

/// One home-controller step: the pose to command and whether every joint
/// settled in this step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub command: Pose,
    pub reached: bool,
}

/// Compute one saturated proportional step from `observed` toward `target`.
///
/// Joints within `close_threshold` of their target are commanded directly to
/// it; all others move by at most `max_step`. `reached` is true only when
/// every joint settled in this same step.
pub fn step_toward(
    observed: &Pose,
    target: &Pose,
    max_step: f64,
    close_threshold: f64,
) -> Result<StepOutcome> {
    let mut command = Vec::with_capacity(target.len());
    let mut reached = true;

    for (joint, target_value) in target.iter() {
        let current = observed.get(joint).ok_or_else(|| {
            ArmctlError::Robot(format!("observation missing joint '{}'", joint))
        })?;
        let diff = target_value - current;
        if diff.abs() < close_threshold {
            command.push((joint, target_value));
        } else {
            command.push((joint, current + diff.clamp(-max_step, max_step)));
            reached = false;
        }
    }

    Ok(StepOutcome {
        command: command.into_iter().collect(),
        reached,
    })
}

/// Cheap predicate: is the observed pose within `tolerance` of home on every
/// joint? Decouples "close enough to attempt homing" from "fully homed".
pub fn is_near_home(observed: &Pose, home: &Pose, tolerance: f64) -> bool {
    observed.is_within(home, tolerance)
}

/// Drive the robot to the home pose.
///
/// Loops: sample the observation, compute one step, send it, sleep the settle
/// interval, repeat until reached. Bounded by `opts.max_iterations`; running
/// out of budget is a fatal [`ArmctlError::ConvergenceTimeout`].
pub async fn return_to_home<R>(robot: &R, home: &Pose, opts: &HomingOptions) -> Result<()>
where
    R: RobotDriver + ?Sized,
{
    let settle = Duration::from_millis(opts.settle_interval_ms);

    for iteration in 0..opts.max_iterations {
        let observation = robot.observe().await?;
        let step = step_toward(
            &observation.joints,
            home,
            opts.step_size,
            opts.close_threshold,
        )?;
        robot.send_action(&step.command).await?;
        if step.reached {
            debug!("Home pose reached after {} steps", iteration + 1);
            return Ok(());
        }
        tokio::time::sleep(settle).await;
    }

    Err(ArmctlError::ConvergenceTimeout(opts.max_iterations))
}
