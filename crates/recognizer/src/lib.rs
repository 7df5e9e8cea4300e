//! Recognition client: one `generateContent` call per captured frame.
//!
//! The remote model is asked for a JSON object with a single integer field
//! `number`; `0` means "no confident gesture". Transport and HTTP failures
//! surface as [`ServiceError`], while a body that cannot be coerced into the
//! expected shape yields `Ok(None)`.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
pub use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use shared::domain::EncodedFrame;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const GESTURE_PROMPT: &str = "Analyze this image of a hand gesture. The user is \
attempting to show a number between 1 and 10 using their fingers. Respond with a \
JSON object containing a single key 'number'. The value should be the integer you \
identified. If the gesture is not a clear number between 1 and 10, the value \
should be 0.";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("recognition request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("recognition service returned {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("recognition service returned no content")]
    EmptyResponse,
}

impl ServiceError {
    /// Message suitable for the error banner: the service-provided message
    /// when there is one, a generic fallback otherwise.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { status, message } => {
                if message.trim().is_empty() {
                    format!("Recognition service returned {status}.")
                } else {
                    message.clone()
                }
            }
            Self::Transport(_) => "Failed to reach the recognition service.".to_string(),
            Self::EmptyResponse => {
                "The recognition service returned an unexpected response.".to_string()
            }
        }
    }
}

/// Contract between the interaction controller's backend worker and the
/// remote vision-language service. Injectable so tests can substitute a
/// scripted double.
#[async_trait]
pub trait GestureRecognizer: Send + Sync {
    /// `Ok(Some(n))` on structural success (including `0`), `Ok(None)` when
    /// the model's answer cannot be parsed into an integer `number` field.
    async fn recognize(&self, frame: &EncodedFrame) -> Result<Option<i64>, ServiceError>;
}

pub struct GeminiRecognizer {
    http: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiRecognizer {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, ServiceError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    /// Point the client at a different service root. Used for local mock
    /// servers in tests and for proxy deployments.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl GestureRecognizer for GeminiRecognizer {
    async fn recognize(&self, frame: &EncodedFrame) -> Result<Option<i64>, ServiceError> {
        let request = GenerateContentRequest::for_frame(frame);
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_service_message(&body).unwrap_or(body);
            warn!(%status, "recognition request rejected");
            return Err(ServiceError::Status { status, message });
        }

        let body: GenerateContentResponse = response.json().await?;
        let text = body.first_text().ok_or(ServiceError::EmptyResponse)?;
        debug!(answer = text, "model answered");
        Ok(parse_gesture_payload(text))
    }
}

/// Parse the model's constrained JSON answer. `None` when the body is not
/// valid JSON or lacks an integer `number` field.
fn parse_gesture_payload(text: &str) -> Option<i64> {
    let value: serde_json::Value = serde_json::from_str(text.trim()).ok()?;
    value.get("number")?.as_i64()
}

/// Pull the human-readable message out of the service's error envelope.
fn extract_service_message(body: &str) -> Option<String> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    envelope.error?.message
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    fn for_frame(frame: &EncodedFrame) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![
                    Part {
                        inline_data: Some(InlineData {
                            mime_type: frame.mime_type.to_string(),
                            data: STANDARD.encode(&frame.bytes),
                        }),
                        text: None,
                    },
                    Part {
                        inline_data: None,
                        text: Some(GESTURE_PROMPT.to_string()),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: serde_json::json!({
                    "type": "OBJECT",
                    "properties": {
                        "number": {
                            "type": "INTEGER",
                            "description": "The number represented by the hand gesture (1-10). \
                                            Returns 0 if not recognizable or invalid.",
                        },
                    },
                    "required": ["number"],
                }),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .find_map(|part| part.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
