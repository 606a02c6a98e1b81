//! Google Gemini client for text generation.
//!
//! Talks to the Generative Language REST API directly.
//! See: <https://ai.google.dev/api/generate-content>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::GenerateProvider;
use crate::types::{GenerateOptions, GenerateResponse, ModelInfo};
use crate::{EscribaError, Result};

/// Default base URL for the Generative Language API
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Page size used when listing models.
const LIST_PAGE_SIZE: u32 = 100;

/// Client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    http: Client,
    base_url: String,
}

impl GeminiClient {
    /// Create a client against the public endpoint with the default timeout.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom base URL and timeout (for testing with wiremock).
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(EscribaError::Configuration(
                "Gemini API key is empty".to_string(),
            ));
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EscribaError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key,
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn model_url(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl GenerateProvider for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<GenerateResponse> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: options.temperature,
                candidate_count: options.candidate_count,
            },
        };

        let response = self
            .http
            .post(self.model_url(&options.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let response = check_status(response, &options.model).await?;
        let body: GenerateContentResponse = response.json().await?;

        let text = body.first_text();
        if text.trim().is_empty() {
            if let Some(reason) = body.block_reason() {
                return Err(EscribaError::ContentFiltered { reason });
            }
            return Err(EscribaError::EmptyResponse);
        }

        Ok(GenerateResponse {
            text,
            model: body.model_version.or_else(|| Some(options.model.clone())),
            finish_reason: body
                .candidates
                .into_iter()
                .next()
                .and_then(|c| c.finish_reason),
        })
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = format!("{}/v1beta/models", self.base_url);
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(&url)
                .header("x-goog-api-key", &self.api_key)
                .query(&[("pageSize", LIST_PAGE_SIZE.to_string())]);
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let response = check_status(request.send().await?, "models").await?;
            let page: ListModelsResponse = response.json().await?;
            debug!(count = page.models.len(), "fetched model page");

            models.extend(page.models.into_iter().map(ModelInfo::from));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(models)
    }
}

/// Map a non-success status to an error, consuming the body for its message.
async fn check_status(response: Response, model: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs);

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| format!("Gemini API error: {status}"));

    match status.as_u16() {
        400 => Err(EscribaError::InvalidInput(message)),
        401 | 403 => Err(EscribaError::AuthenticationFailed),
        404 => Err(EscribaError::ModelNotFound(model.to_string())),
        429 => Err(EscribaError::RateLimited { retry_after }),
        code => Err(EscribaError::Api {
            status: code,
            message,
        }),
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    candidate_count: Option<u32>,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    model_version: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    fn first_text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    fn block_reason(&self) -> Option<String> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
        {
            return Some(reason);
        }
        self.candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
            .filter(|r| matches!(*r, "SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "RECITATION"))
            .map(str::to_string)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<RemoteModel>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteModel {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

impl From<RemoteModel> for ModelInfo {
    fn from(m: RemoteModel) -> Self {
        let id = m.name.strip_prefix("models/").unwrap_or(&m.name).to_string();
        ModelInfo {
            id,
            display_name: m.display_name,
            supports_generate: m
                .supported_generation_methods
                .iter()
                .any(|method| method == "generateContent"),
        }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_url_strips_models_prefix() {
        let client = GeminiClient::with_base_url("k", "http://host/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(
            client.model_url("models/gemini-2.0-flash"),
            "http://host/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert_eq!(
            client.model_url("gemini-2.0-flash"),
            "http://host/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn empty_key_is_configuration_error() {
        let result = GeminiClient::new("  ");
        assert!(matches!(result, Err(EscribaError::Configuration(_))));
    }

    #[test]
    fn request_uses_camel_case_generation_config() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some("hi".into()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: Some(0.2),
                candidate_count: Some(1),
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["generationConfig"]["candidateCount"], 1);
        assert!(json["generationConfig"]["temperature"].is_number());
    }

    #[test]
    fn first_text_joins_parts() {
        let body: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": "Aos "}, {"text": "dez dias"}]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(body.first_text(), "Aos dez dias");
        assert!(body.block_reason().is_none());
    }

    #[test]
    fn block_reason_from_prompt_feedback() {
        let body: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        assert_eq!(body.first_text(), "");
        assert_eq!(body.block_reason().as_deref(), Some("SAFETY"));
    }

    #[test]
    fn remote_model_conversion() {
        let info = ModelInfo::from(RemoteModel {
            name: "models/gemini-2.5-flash".into(),
            display_name: Some("Gemini 2.5 Flash".into()),
            supported_generation_methods: vec!["generateContent".into(), "countTokens".into()],
        });
        assert_eq!(info.id, "gemini-2.5-flash");
        assert!(info.supports_generate);
    }
}
