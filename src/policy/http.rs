//! HTTP policy inference client.
//!
//! Runs one control step against a remote inference server. The skill's model
//! reference is the server endpoint; each request carries the observation and
//! the task label, and the response is the action vector keyed to the robot's
//! declared action joints.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::domain::Skill;
use crate::error::{ArmctlError, Result};
use crate::policy::{Policy, PolicyProvider};
use crate::robot::Observation;

/// Per-step request timeout. A policy server slower than this cannot hold
/// any realistic control rate anyway.
const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    observation: &'a Observation,
    task: &'a str,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    action: Vec<f64>,
}

/// Policy backed by a remote inference endpoint.
pub struct HttpPolicy {
    client: Client,
    endpoint: String,
}

impl HttpPolicy {
    /// Create a policy client for the given endpoint.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_STEP_TIMEOUT)
            .build()
            .map_err(|e| ArmctlError::Configuration(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Policy for HttpPolicy {
    async fn predict(&self, observation: &Observation, task: &str) -> Result<Vec<f64>> {
        let request = PredictRequest { observation, task };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| ArmctlError::Robot(format!("policy server unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(ArmctlError::Robot(format!(
                "policy server returned {}",
                response.status()
            )));
        }

        let parsed: PredictResponse = response
            .json()
            .await
            .map_err(|e| ArmctlError::Robot(format!("policy response: {}", e)))?;
        Ok(parsed.action)
    }
}

/// Provider that treats each skill's model reference as an inference endpoint.
pub struct HttpPolicyProvider;

impl PolicyProvider for HttpPolicyProvider {
    fn policy_for(&self, skill: &Skill) -> Result<Arc<dyn Policy>> {
        if !skill.model.starts_with("http://") && !skill.model.starts_with("https://") {
            return Err(ArmctlError::Configuration(format!(
                "skill '{}' model reference '{}' is not an inference endpoint",
                skill.name, skill.model
            )));
        }
        Ok(Arc::new(HttpPolicy::new(&skill.model)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_rejects_non_url_model_ref() {
        let skill = Skill::new("stir_spoon", "/models/stir.safetensors", 40.0, "q");
        let err = HttpPolicyProvider.policy_for(&skill).unwrap_err();
        assert!(matches!(err, ArmctlError::Configuration(_)));
    }

    #[test]
    fn test_provider_accepts_http_endpoint() {
        let skill = Skill::new("stir_spoon", "http://localhost:9090/predict", 40.0, "q");
        assert!(HttpPolicyProvider.policy_for(&skill).is_ok());
    }

    #[test]
    fn test_predict_request_shape() {
        let obs = Observation::from_joints([("a", 1.0)].into_iter().collect());
        let request = PredictRequest {
            observation: &obs,
            task: "stir",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["task"], "stir");
        assert_eq!(json["observation"]["joints"]["a"], 1.0);
    }
}
