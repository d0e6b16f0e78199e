//! Structured extraction service interface.
//!
//! The conversation pipeline hands each user utterance to an
//! [`ExtractionService`] and receives either a fully validated
//! [`ExtractionResponse`] or an [`ExtractionError`]. There is no partial
//! result.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Request sent to the extraction service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRequest {
    pub prompt_text: String,
    pub page_context: String,
}

impl ExtractionRequest {
    pub fn new(prompt_text: impl Into<String>, page_context: impl Into<String>) -> Self {
        Self {
            prompt_text: prompt_text.into(),
            page_context: page_context.into(),
        }
    }
}

/// Validated structured output of the extraction service.
///
/// `response` is required; every other field is optional. Deserializing a
/// payload with a missing `response` or a mistyped field fails. Unknown
/// extra fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResponse {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_concept: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_market: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_features: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_steps: Option<Vec<String>>,
}

impl ExtractionResponse {
    /// Parses and validates a raw JSON payload against the output schema.
    pub fn from_json(raw: &str) -> Result<Self, ExtractionError> {
        serde_json::from_str(raw.trim()).map_err(|e| ExtractionError::Schema(e.to_string()))
    }

    /// A reply with no extracted facts.
    pub fn reply_only(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            ..Default::default()
        }
    }
}

/// Failure of one extraction call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The request never produced an HTTP response.
    #[error("Extraction transport failed: {0}")]
    Transport(String),

    /// The call exceeded the client's time limit.
    #[error("Extraction timed out after {0} ms")]
    Timeout(u64),

    /// The service answered with a non-success status.
    #[error("Extraction service returned {status}: {message}")]
    Http { status: u16, message: String },

    /// The service answered without any candidate text.
    #[error("Extraction service returned no content")]
    EmptyResponse,

    /// The payload did not match the output schema.
    #[error("Extraction payload violates schema: {0}")]
    Schema(String),

    /// The client could not be configured (e.g. missing API key).
    #[error("Extraction client misconfigured: {0}")]
    Config(String),
}

impl ExtractionError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema(_))
    }
}

/// An external service that turns free text into structured business facts.
#[async_trait]
pub trait ExtractionService: Send + Sync {
    async fn extract(
        &self,
        request: ExtractionRequest,
    ) -> Result<ExtractionResponse, ExtractionError>;
}
