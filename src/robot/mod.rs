//! Robot driver interface.
//!
//! The hardware driver is an external collaborator; armctl consumes it as an
//! opaque capability behind [`RobotDriver`]. Exactly one driver handle exists
//! per run, opened once and reused across all skills and retries. Within an
//! active episode loop the loop is the sole agent sending commands; the home
//! controller and episode loop never run concurrently.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::Pose;
use crate::error::Result;

pub mod sim;

pub use sim::SimRobot;

/// One observation sampled from the robot: joint positions plus any extra
/// scalar sensor channels the driver exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Current joint positions.
    pub joints: Pose,
    /// Non-joint scalar sensors (load, temperature, ...). May be empty.
    #[serde(default)]
    pub sensors: BTreeMap<String, f64>,
}

impl Observation {
    /// Observation carrying only joint positions.
    pub fn from_joints(joints: Pose) -> Self {
        Self {
            joints,
            sensors: BTreeMap::new(),
        }
    }
}

/// Interface to the robot hardware.
///
/// `send_action` returns the action actually applied: the driver may clip
/// commands to safety limits, and the applied action is what gets recorded.
#[async_trait]
pub trait RobotDriver: Send + Sync {
    /// Open the connection to the hardware.
    async fn connect(&self) -> Result<()>;

    /// Close the connection.
    async fn disconnect(&self) -> Result<()>;

    /// Sample the current observation.
    async fn observe(&self) -> Result<Observation>;

    /// Command target joint positions; returns the applied (possibly clipped)
    /// action.
    async fn send_action(&self, action: &Pose) -> Result<Pose>;

    /// Joint names the driver accepts in actions, in the order the policy
    /// emits its action vector.
    fn action_joints(&self) -> Vec<String>;
}
