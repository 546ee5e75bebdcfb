//! Gemini REST client.
//!
//! Thin client over the generateContent endpoint and the File API (upload +
//! state polling), shared by the planner and the validation gate. Calls are
//! synchronous from the orchestrator's point of view: the robot is parked at
//! home while they run, so blocking on the network is acceptable.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use reqwest::multipart::{Form, Part as MultipartPart};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ArmctlError, Result};

/// Default model for planning and judging.
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";

const BASE_URL: &str = "https://generativelanguage.googleapis.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Processing state of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    /// Still being processed; not yet usable in prompts.
    Processing,
    /// Ready for analysis.
    Active,
    /// Processing failed.
    Failed,
    /// Any state this client does not know about.
    #[serde(other)]
    Unknown,
}

/// A file uploaded to the File API.
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiFile {
    /// Resource name, `files/{id}`.
    pub name: String,
    /// URI referenced from prompt parts.
    pub uri: String,
    /// Current processing state.
    pub state: FileState,
}

/// One part of a prompt.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PromptPart {
    Text {
        text: String,
    },
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
}

/// Reference to an uploaded file inside a prompt.
#[derive(Debug, Clone, Serialize)]
pub struct FileData {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    #[serde(rename = "fileUri")]
    pub file_uri: String,
}

impl PromptPart {
    /// Text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Uploaded-file part.
    pub fn file(file: &GeminiFile, mime_type: impl Into<String>) -> Self {
        Self::FileData {
            file_data: FileData {
                mime_type: mime_type.into(),
                file_uri: file.uri.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<Value>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<PromptPart>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: GeminiFile,
}

/// Client for the Gemini generateContent and File APIs.
pub struct GeminiClient {
    http: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Create a client for the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ArmctlError::Llm(format!("http client: {}", e)))?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// One generateContent call; returns the concatenated candidate text.
    pub async fn generate_content(
        &self,
        parts: Vec<PromptPart>,
        generation_config: Option<Value>,
    ) -> Result<String> {
        let url = format!("{}/v1beta/models/{}:generateContent", BASE_URL, self.model);
        let request = GenerateContentRequest {
            contents: vec![Content { parts }],
            generation_config,
        };

        debug!(model = %self.model, "Calling generateContent");
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ArmctlError::Llm(format!("generateContent request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "generateContent failed");
            return Err(ArmctlError::Llm(format!(
                "generateContent returned {}: {}",
                status, body
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ArmctlError::Llm(format!("generateContent response: {}", e)))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect();
        if text.is_empty() {
            return Err(ArmctlError::Llm("empty generateContent response".to_string()));
        }
        Ok(text)
    }

    /// Upload a local file to the File API.
    pub async fn upload_file(&self, path: &Path, mime_type: &str) -> Result<GeminiFile> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ArmctlError::Llm(format!("cannot read artifact {}: {}", path.display(), e))
        })?;
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "artifact".to_string());

        debug!(path = %path.display(), bytes = bytes.len(), "Uploading file");

        let metadata = serde_json::to_string(&serde_json::json!({
            "file": { "display_name": display_name }
        }))?;
        let form = Form::new()
            .part(
                "metadata",
                MultipartPart::text(metadata).mime_str("application/json").map_err(
                    |e| ArmctlError::Llm(format!("upload metadata: {}", e)),
                )?,
            )
            .part(
                "file",
                MultipartPart::bytes(bytes)
                    .file_name(display_name)
                    .mime_str(mime_type)
                    .map_err(|e| ArmctlError::Llm(format!("upload mime: {}", e)))?,
            );

        let url = format!("{}/upload/v1beta/files", BASE_URL);
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ArmctlError::Llm(format!("upload request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ArmctlError::Llm(format!(
                "upload returned {}: {}",
                status, body
            )));
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| ArmctlError::Llm(format!("upload response: {}", e)))?;
        Ok(parsed.file)
    }

    /// Fetch the current state of an uploaded file.
    pub async fn get_file(&self, name: &str) -> Result<GeminiFile> {
        let url = format!("{}/v1beta/{}", BASE_URL, name);
        let response = self
            .http
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| ArmctlError::Llm(format!("file poll request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArmctlError::Llm(format!("file poll returned {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| ArmctlError::Llm(format!("file poll response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_part_serialization() {
        let part = PromptPart::text("hello");
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json, serde_json::json!({"text": "hello"}));
    }

    #[test]
    fn test_file_part_serialization() {
        let file = GeminiFile {
            name: "files/abc".to_string(),
            uri: "https://example.test/files/abc".to_string(),
            state: FileState::Active,
        };
        let part = PromptPart::file(&file, "video/mp4");
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["fileData"]["mimeType"], "video/mp4");
        assert_eq!(json["fileData"]["fileUri"], "https://example.test/files/abc");
    }

    #[test]
    fn test_file_state_deserialization() {
        let file: GeminiFile = serde_json::from_value(serde_json::json!({
            "name": "files/abc",
            "uri": "u",
            "state": "PROCESSING"
        }))
        .unwrap();
        assert_eq!(file.state, FileState::Processing);

        let file: GeminiFile = serde_json::from_value(serde_json::json!({
            "name": "files/abc",
            "uri": "u",
            "state": "SOMETHING_NEW"
        }))
        .unwrap();
        assert_eq!(file.state, FileState::Unknown);
    }

    #[test]
    fn test_request_shape_includes_generation_config() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![PromptPart::text("q")],
            }],
            generation_config: Some(serde_json::json!({"responseMimeType": "application/json"})),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "q");
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn test_response_text_extraction() {
        let parsed: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [
                {"content": {"parts": [{"text": "Yes, "}, {"text": "it worked."}]}}
            ]
        }))
        .unwrap();
        let text: String = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect();
        assert_eq!(text, "Yes, it worked.");
    }
}
