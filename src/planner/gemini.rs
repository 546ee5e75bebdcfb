//! Gemini-backed planner.
//!
//! Asks the model to order the available skill names against the task
//! instruction, constrained to a JSON array-of-strings response.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::error::{ArmctlError, Result};
use crate::gemini::{GeminiClient, PromptPart};
use crate::planner::Planner;

/// Planner backed by a Gemini generateContent call.
pub struct GeminiPlanner {
    client: GeminiClient,
}

impl GeminiPlanner {
    /// Create a planner over an existing Gemini client.
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }

    fn build_prompt(instruction: &str, available: &[String]) -> String {
        format!(
            "List the tools in the right order so that the provided steps can be completed. \
             Note that there might not be a tool for every step.\n\n\
             {}\n\
             Available tools: {:?}",
            instruction, available
        )
    }
}

#[async_trait]
impl Planner for GeminiPlanner {
    async fn plan(&self, instruction: &str, available: &[String]) -> Result<Vec<String>> {
        let prompt = Self::build_prompt(instruction, available);
        let config = json!({
            "responseMimeType": "application/json",
            "responseSchema": { "type": "ARRAY", "items": { "type": "STRING" } }
        });

        let answer = self
            .client
            .generate_content(vec![PromptPart::text(prompt)], Some(config))
            .await?;
        debug!(answer = %answer, "Planner answered");

        serde_json::from_str(&answer)
            .map_err(|e| ArmctlError::Llm(format!("planner returned invalid JSON: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_carries_instruction_and_tools() {
        let prompt = GeminiPlanner::build_prompt(
            "Steps for making tea:\n1) Boil water",
            &["stir_spoon".to_string()],
        );
        assert!(prompt.contains("Boil water"));
        assert!(prompt.contains("stir_spoon"));
        assert!(prompt.starts_with("List the tools in the right order"));
    }
}
