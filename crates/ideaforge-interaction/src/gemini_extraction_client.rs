//! GeminiExtractionClient - structured extraction over the Gemini REST API.
//!
//! Each call sends one `generateContent` request with a JSON response schema
//! and validates the returned candidate text as an [`ExtractionResponse`].

use async_trait::async_trait;
use ideaforge_core::config::ExtractionConfig;
use ideaforge_core::extraction::{
    ExtractionError, ExtractionRequest, ExtractionResponse, ExtractionService,
};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::{Duration, Instant};

use crate::prompt::{DEFAULT_SYSTEM_INSTRUCTION, ExtractionPrompt};

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// [`ExtractionService`] backed by the Gemini HTTP API.
pub struct GeminiExtractionClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
    system_instruction: String,
    prompt: ExtractionPrompt,
}

impl GeminiExtractionClient {
    /// Creates a client from configuration.
    ///
    /// The API key comes from `config.api_key`, else from `GEMINI_API_KEY`.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ExtractionError> {
        let api_key = resolve_api_key(config.api_key.as_deref(), std::env::var(API_KEY_ENV).ok())?;
        let timeout = Duration::from_secs(config.timeout_secs);

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractionError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
            system_instruction: config
                .system_instruction
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_INSTRUCTION.to_string()),
            prompt: ExtractionPrompt::new()?,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn build_request(&self, request: &ExtractionRequest) -> Result<GenerateContentRequest, ExtractionError> {
        let text = self.prompt.render(request)?;
        Ok(GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part { text }],
            }],
            system_instruction: Some(Content {
                role: "system".to_string(),
                parts: vec![Part {
                    text: self.system_instruction.clone(),
                }],
            }),
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: response_schema(),
            },
        })
    }

    async fn send_request(&self, body: &GenerateContentRequest) -> Result<String, ExtractionError> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| self.map_transport_error(err))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| self.map_transport_error(err))?;

        extract_text_response(parsed)
    }

    fn map_transport_error(&self, err: reqwest::Error) -> ExtractionError {
        let err = err.without_url();
        if err.is_timeout() {
            ExtractionError::Timeout(self.timeout_millis())
        } else if err.is_decode() {
            ExtractionError::Schema(format!("Failed to parse Gemini envelope: {err}"))
        } else {
            ExtractionError::Transport(format!("Gemini API request failed: {err}"))
        }
    }

    fn timeout_millis(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

#[async_trait]
impl ExtractionService for GeminiExtractionClient {
    async fn extract(
        &self,
        request: ExtractionRequest,
    ) -> Result<ExtractionResponse, ExtractionError> {
        let body = self.build_request(&request)?;
        let started = Instant::now();

        tracing::debug!(
            "[GeminiExtractionClient] Sending extraction request (model={}, page={})",
            self.model,
            request.page_context
        );

        let text = match tokio::time::timeout(self.timeout, self.send_request(&body)).await {
            Ok(result) => result?,
            Err(_) => return Err(ExtractionError::Timeout(self.timeout_millis())),
        };

        let parsed = ExtractionResponse::from_json(strip_code_fence(&text))?;
        tracing::debug!(
            "[GeminiExtractionClient] Extraction succeeded in {:?}",
            started.elapsed()
        );
        Ok(parsed)
    }
}

impl std::fmt::Debug for GeminiExtractionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiExtractionClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn resolve_api_key(
    configured: Option<&str>,
    from_env: Option<String>,
) -> Result<String, ExtractionError> {
    configured
        .map(str::to_string)
        .or(from_env)
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| {
            ExtractionError::Config(format!(
                "No Gemini API key: set extraction.api_key in config.toml or {API_KEY_ENV}"
            ))
        })
}

/// Output schema in the Gemini `responseSchema` dialect.
fn response_schema() -> Value {
    let string_list = json!({ "type": "ARRAY", "items": { "type": "STRING" } });
    json!({
        "type": "OBJECT",
        "properties": {
            "response": { "type": "STRING" },
            "businessConcept": { "type": "STRING" },
            "targetMarket": { "type": "STRING" },
            "keyFeatures": string_list.clone(),
            "nextSteps": string_list,
        },
        "required": ["response"],
    })
}

// The service sometimes wraps JSON output in a markdown fence.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String, ExtractionError> {
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .filter(|text| !text.trim().is_empty())
        .ok_or(ExtractionError::EmptyResponse)
}

fn map_http_error(status: StatusCode, body: String) -> ExtractionError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    ExtractionError::Http {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "test-key-7f3a";

    fn client() -> GeminiExtractionClient {
        let config = ExtractionConfig {
            api_key: Some(TEST_KEY.to_string()),
            base_url: "http://127.0.0.1:9/models/".to_string(),
            timeout_secs: 1,
            ..ExtractionConfig::default()
        };
        GeminiExtractionClient::from_config(&config).unwrap()
    }

    #[test]
    fn test_request_body_shape() {
        let body = client()
            .build_request(&ExtractionRequest::new("Used books for students", "dream"))
            .unwrap();
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["contents"][0]["role"], "user");
        let text = value["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.contains("Used books for students"));
        assert_eq!(
            value["systemInstruction"]["parts"][0]["text"],
            DEFAULT_SYSTEM_INSTRUCTION
        );
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
        let schema = &value["generationConfig"]["responseSchema"];
        assert_eq!(schema["required"], json!(["response"]));
        assert_eq!(schema["properties"]["keyFeatures"]["type"], "ARRAY");
    }

    #[test]
    fn test_from_config_trims_base_url_and_keeps_model() {
        let client = client();
        assert_eq!(client.base_url, "http://127.0.0.1:9/models");
        assert_eq!(client.model(), ideaforge_core::config::DEFAULT_GEMINI_MODEL);
        assert_eq!(client.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_resolve_api_key() {
        assert_eq!(resolve_api_key(Some("a"), Some("b".into())).unwrap(), "a");
        assert_eq!(resolve_api_key(None, Some(" b ".into())).unwrap(), "b");
        assert!(matches!(
            resolve_api_key(None, None),
            Err(ExtractionError::Config(_))
        ));
        assert!(resolve_api_key(Some("  "), None).is_err());
    }

    #[test]
    fn test_map_http_error_uses_json_body() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        let err = map_http_error(StatusCode::TOO_MANY_REQUESTS, body.to_string());
        assert_eq!(
            err,
            ExtractionError::Http {
                status: 429,
                message: "RESOURCE_EXHAUSTED: Quota exceeded".to_string(),
            }
        );

        let err = map_http_error(StatusCode::BAD_GATEWAY, "upstream down".to_string());
        assert_eq!(
            err,
            ExtractionError::Http {
                status: 502,
                message: "upstream down".to_string(),
            }
        );
    }

    #[test]
    fn test_extract_text_response() {
        let parsed: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"response\":\"hi\"}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text_response(parsed).unwrap(), r#"{"response":"hi"}"#);

        let empty: GenerateContentResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert_eq!(
            extract_text_response(empty).unwrap_err(),
            ExtractionError::EmptyResponse
        );
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_extraction_error() {
        let err = client()
            .extract(ExtractionRequest::new("hello", "dream"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::Transport(_) | ExtractionError::Timeout(_)
        ));
    }

    #[tokio::test]
    async fn test_transport_error_does_not_expose_api_key() {
        let err = client()
            .extract(ExtractionRequest::new("hello", "dream"))
            .await
            .unwrap_err();
        let display = err.to_string();
        assert!(!display.contains(TEST_KEY), "{display}");
        assert!(!format!("{err:?}").contains(TEST_KEY));
        assert!(!display.contains("127.0.0.1:9"), "{display}");
    }
}
