//! Policy inference interface.
//!
//! The learned-policy inference engine is an external collaborator: armctl
//! asks it to run one control step, producing an action vector keyed to the
//! robot's declared action joints.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::Skill;
use crate::error::{ArmctlError, Result};
use crate::robot::Observation;

pub mod http;

pub use http::{HttpPolicy, HttpPolicyProvider};

/// One control step of a learned policy.
#[async_trait]
pub trait Policy: Send + Sync {
    /// Map an observation to an action vector.
    ///
    /// The vector is ordered to match the robot's declared action joints;
    /// the episode loop zips the two into a commanded pose.
    async fn predict(&self, observation: &Observation, task: &str) -> Result<Vec<f64>>;
}

impl std::fmt::Debug for dyn Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Policy")
    }
}

/// Builds the policy bound to a skill's model reference.
pub trait PolicyProvider: Send + Sync {
    /// Resolve the skill's model reference into a runnable policy.
    fn policy_for(&self, skill: &Skill) -> Result<Arc<dyn Policy>>;
}

/// Policy that commands the currently observed joint positions.
///
/// Useful for dry runs: the arm holds still while the full episode, session,
/// and retry machinery is exercised.
pub struct HoldPolicy;

#[async_trait]
impl Policy for HoldPolicy {
    async fn predict(&self, observation: &Observation, _task: &str) -> Result<Vec<f64>> {
        Ok(observation.joints.iter().map(|(_, v)| v).collect())
    }
}

/// Provider handing out [`HoldPolicy`] regardless of the model reference.
pub struct HoldPolicyProvider;

impl PolicyProvider for HoldPolicyProvider {
    fn policy_for(&self, skill: &Skill) -> Result<Arc<dyn Policy>> {
        if skill.model.is_empty() {
            return Err(ArmctlError::Configuration(format!(
                "skill '{}' has no model reference",
                skill.name
            )));
        }
        Ok(Arc::new(HoldPolicy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Pose;

    #[tokio::test]
    async fn test_hold_policy_commands_current_pose() {
        let joints: Pose = [("a", 1.5), ("b", -2.0)].into_iter().collect();
        let obs = Observation::from_joints(joints);
        let action = HoldPolicy.predict(&obs, "hold").await.unwrap();
        // BTreeMap order: a, b
        assert_eq!(action, vec![1.5, -2.0]);
    }

    #[test]
    fn test_hold_provider_rejects_empty_model_ref() {
        let skill = Skill::new("stir_spoon", "", 40.0, "Was the cup stirred?");
        let err = HoldPolicyProvider.policy_for(&skill).unwrap_err();
        assert!(matches!(err, ArmctlError::Configuration(_)));
    }
}
