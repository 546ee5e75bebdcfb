//! Gemini vision judge.
//!
//! Uploads the recorded artifact, waits for the File API to finish
//! processing it, then asks the validation question and interprets the
//! textual answer. Latency-bound by design; the robot is already parked at
//! home while this runs.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{ArmctlError, Result};
use crate::gemini::{FileState, GeminiClient, PromptPart};
use crate::validation::{Judge, is_affirmative};

const VIDEO_MIME: &str = "video/mp4";
const POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Upper bound on waiting for the File API; running out is an LLM error,
/// which the retry policy treats as a judged failure.
const POLL_BUDGET: u32 = 120;

/// Vision-language judge backed by Gemini.
pub struct GeminiJudge {
    client: GeminiClient,
}

impl GeminiJudge {
    /// Create a judge over an existing Gemini client.
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }

    async fn wait_until_active(&self, name: &str) -> Result<crate::gemini::GeminiFile> {
        for _ in 0..POLL_BUDGET {
            let file = self.client.get_file(name).await?;
            match file.state {
                FileState::Active => return Ok(file),
                FileState::Failed => {
                    return Err(ArmctlError::Llm(format!(
                        "file {} failed processing",
                        name
                    )));
                }
                FileState::Processing | FileState::Unknown => {
                    debug!(file = name, state = ?file.state, "Waiting for file processing");
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
        }
        Err(ArmctlError::Llm(format!(
            "file {} not active after {} polls",
            name, POLL_BUDGET
        )))
    }
}

#[async_trait]
impl Judge for GeminiJudge {
    async fn judge(&self, artifact: &Path, question: &str) -> Result<bool> {
        info!(artifact = %artifact.display(), "Uploading recording for validation");
        let uploaded = self.client.upload_file(artifact, VIDEO_MIME).await?;
        let file = if uploaded.state == FileState::Active {
            uploaded
        } else {
            self.wait_until_active(&uploaded.name).await?
        };

        let answer = self
            .client
            .generate_content(
                vec![
                    PromptPart::file(&file, VIDEO_MIME),
                    PromptPart::text(format!("{} Please answer with yes or no.", question)),
                ],
                None,
            )
            .await?;

        debug!(answer = %answer, "Judge answered");
        Ok(is_affirmative(&answer))
    }
}
