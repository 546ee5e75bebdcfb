//! Simulated robot driver.
//!
//! A first-order tracking model: each commanded action is optionally clipped
//! to a maximum relative step, then the simulated joints move to the applied
//! positions within one tick. Used by the CLI dry-run mode and by tests that
//! exercise the control loops without hardware.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;

use crate::domain::Pose;
use crate::error::{ArmctlError, Result};
use crate::robot::{Observation, RobotDriver};

/// In-memory robot that tracks commanded positions faithfully.
pub struct SimRobot {
    current: Mutex<Pose>,
    /// Largest per-joint step accepted in one command; larger commands are
    /// clipped, mirroring a driver-side safety limit. `None` disables clipping.
    max_relative_target: Option<f64>,
    connected: AtomicBool,
    actions_sent: AtomicU64,
}

impl SimRobot {
    /// Create a simulated robot starting at the given pose.
    pub fn new(start: Pose) -> Self {
        Self {
            current: Mutex::new(start),
            max_relative_target: None,
            connected: AtomicBool::new(false),
            actions_sent: AtomicU64::new(0),
        }
    }

    /// Enable driver-side clipping of commands to `max_step` per joint.
    pub fn with_max_relative_target(mut self, max_step: f64) -> Self {
        self.max_relative_target = Some(max_step);
        self
    }

    /// Number of actions sent so far. Used by tests to assert that a
    /// configuration failure happened before any robot command.
    pub fn actions_sent(&self) -> u64 {
        self.actions_sent.load(Ordering::SeqCst)
    }

    /// Snapshot of the simulated joint positions.
    pub fn current_pose(&self) -> Pose {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn clip(&self, current: &Pose, action: &Pose) -> Pose {
        match self.max_relative_target {
            None => action.clone(),
            Some(max_step) => action
                .iter()
                .map(|(joint, target)| {
                    let applied = match current.get(joint) {
                        Some(now) => now + (target - now).clamp(-max_step, max_step),
                        None => target,
                    };
                    (joint, applied)
                })
                .collect(),
        }
    }
}

#[async_trait]
impl RobotDriver for SimRobot {
    async fn connect(&self) -> Result<()> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn observe(&self) -> Result<Observation> {
        let current = self
            .current
            .lock()
            .map_err(|e| ArmctlError::Robot(e.to_string()))?;
        Ok(Observation::from_joints(current.clone()))
    }

    async fn send_action(&self, action: &Pose) -> Result<Pose> {
        let mut current = self
            .current
            .lock()
            .map_err(|e| ArmctlError::Robot(e.to_string()))?;
        let applied = self.clip(&current, action);
        // Joints not named in the action hold their positions.
        *current = current
            .iter()
            .map(|(joint, now)| (joint, applied.get(joint).unwrap_or(now)))
            .collect();
        self.actions_sent.fetch_add(1, Ordering::SeqCst);
        Ok(applied)
    }

    fn action_joints(&self) -> Vec<String> {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .joint_names()
            .map(str::to_string)
            .collect()
    }
}
