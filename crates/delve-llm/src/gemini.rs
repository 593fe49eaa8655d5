//! Google Gemini API backend implementation.
//!
//! This module provides `GeminiBackend`, which talks to the Generative Language
//! REST API (`models/{model}:generateContent`). It supports JSON-schema
//! constrained output and Google Search grounding, whose sources are surfaced
//! as [`Citation`]s on the response.

use async_trait::async_trait;
use reqwest::{Client, Response, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::backend::{LlmBackend, with_retry};
use crate::error::{LlmError, ResponseValidationError, Result};
use crate::types::{
    Citation, CompletionRequest, CompletionResponse, ContentBlock, ResponseFormat, Role,
    StopReason, Usage,
};

/// Default Generative Language API base URL.
const DEFAULT_GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model when neither config nor request names one.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";

/// Default timeout for requests.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for the Gemini backend.
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key for authentication.
    pub api_key: String,

    /// Base URL for the API.
    pub base_url: String,

    /// Model used when a request leaves `model` empty.
    pub model: String,

    /// Request timeout.
    pub timeout: Duration,

    /// Maximum retries for transient errors.
    pub max_retries: u32,

    /// Initial backoff duration for retries.
    pub retry_backoff: Duration,

    /// Name for this backend instance.
    pub name: String,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff", &self.retry_backoff)
            .field("name", &self.name)
            .finish()
    }
}

impl GeminiConfig {
    /// Create a new config with the given API key and default settings.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_GEMINI_BASE.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: 2,
            retry_backoff: Duration::from_millis(500),
            name: "gemini".to_string(),
        }
    }

    /// Create config from the `GEMINI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            LlmError::Config("GEMINI_API_KEY environment variable not set".to_string())
        })?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the default model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set max retries.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the initial retry backoff.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Gemini Backend
// ─────────────────────────────────────────────────────────────────────────────

/// Gemini API backend.
pub struct GeminiBackend {
    client: Client,
    config: GeminiConfig,
}

impl GeminiBackend {
    /// Create a new Gemini backend with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::Config("Gemini API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Create a Gemini backend from environment.
    pub fn from_env() -> Result<Self> {
        Self::new(GeminiConfig::from_env()?)
    }

    /// Build the generateContent endpoint URL for a model.
    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }

    fn add_headers(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, &self.config.api_key)
    }

    fn resolve_model<'a>(&'a self, request: &'a CompletionRequest) -> &'a str {
        if request.model.trim().is_empty() {
            &self.config.model
        } else {
            &request.model
        }
    }

    /// Convert our CompletionRequest to the Gemini wire format.
    fn to_gemini_request(request: &CompletionRequest) -> GeminiRequest {
        let contents = request
            .messages
            .iter()
            .map(|m| GeminiContent {
                role: Some(
                    match m.role {
                        Role::User => "user",
                        Role::Assistant => "model",
                    }
                    .to_string(),
                ),
                parts: vec![GeminiPart {
                    text: Some(m.content.clone()),
                }],
            })
            .collect();

        let system_instruction = request.system.as_ref().map(|s| GeminiContent {
            role: None,
            parts: vec![GeminiPart {
                text: Some(s.clone()),
            }],
        });

        let (response_mime_type, response_schema) = match &request.response_format {
            Some(ResponseFormat::JsonSchema { schema }) => (
                Some("application/json".to_string()),
                Some(sanitize_schema(schema)),
            ),
            None => (None, None),
        };

        let tools = if request.web_search {
            Some(vec![serde_json::json!({ "google_search": {} })])
        } else {
            None
        };

        GeminiRequest {
            contents,
            system_instruction,
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: Some(request.max_tokens),
                response_mime_type,
                response_schema,
            },
            tools,
        }
    }

    /// Handle a successful or error response.
    async fn handle_response(response: Response, model: &str) -> Result<CompletionResponse> {
        if !response.status().is_success() {
            return Err(Self::handle_error_response(response).await);
        }

        let body: GeminiResponse = response.json().await.map_err(|e| {
            LlmError::Serialization(format!("Failed to parse Gemini response: {}", e))
        })?;

        Self::from_gemini_response(body, model)
    }

    /// Convert a Gemini response to our CompletionResponse.
    fn from_gemini_response(body: GeminiResponse, model: &str) -> Result<CompletionResponse> {
        if let Some(reason) = body
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(ResponseValidationError::blocked(reason).into());
        }

        let candidate = body
            .candidates
            .and_then(|c| c.into_iter().next())
            .ok_or(ResponseValidationError::NoCandidates)?;

        let content: Vec<ContentBlock> = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.text)
            .map(ContentBlock::text)
            .collect();

        let stop_reason = candidate.finish_reason.as_deref().map(parse_finish_reason);

        if content.is_empty() && stop_reason == Some(StopReason::ContentFilter) {
            return Err(ResponseValidationError::blocked("SAFETY").into());
        }

        let citations = candidate
            .grounding_metadata
            .map(|g| {
                g.grounding_chunks
                    .into_iter()
                    .filter_map(|chunk| chunk.web)
                    .filter(|web| !web.uri.trim().is_empty())
                    .map(|web| match web.title.filter(|t| !t.trim().is_empty()) {
                        Some(title) => Citation::new(web.uri).with_title(title),
                        None => Citation::new(web.uri),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let usage = body
            .usage_metadata
            .map(|u| Usage::new(u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();

        Ok(CompletionResponse {
            id: body
                .response_id
                .unwrap_or_else(|| format!("gemini_{}", uuid::Uuid::new_v4())),
            model: body.model_version.unwrap_or_else(|| model.to_string()),
            content,
            stop_reason,
            usage,
            citations,
        })
    }

    /// Map an error response to an LlmError.
    async fn handle_error_response(response: Response) -> LlmError {
        let status = response.status();
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = response.text().await.unwrap_or_default();

        let message = serde_json::from_str::<GeminiErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| format!("HTTP {}: {}", status, body));

        LlmError::from_status(status.as_u16(), message, retry_after.as_deref())
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let model = self.resolve_model(&request).to_string();
        let gemini_request = Self::to_gemini_request(&request);
        let url = self.generate_url(&model);

        tracing::debug!(
            backend = %self.config.name,
            model = %model,
            messages = gemini_request.contents.len(),
            web_search = request.web_search,
            json = request.wants_json(),
            "Sending Gemini request"
        );

        with_retry(
            self.config.max_retries,
            self.config.retry_backoff,
            &self.config.name,
            || async {
                let response = self
                    .add_headers(self.client.post(&url))
                    .json(&gemini_request)
                    .send()
                    .await?;

                Self::handle_response(response, &model).await
            },
        )
        .await
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn default_model(&self) -> Option<&str> {
        Some(&self.config.model)
    }
}

/// Recursively strip JSON Schema keywords the Gemini API rejects.
///
/// Kept: `type`, `description`, `properties`, `required`, `enum`, `items`,
/// `format`, `nullable`.
pub fn sanitize_schema(schema: &Value) -> Value {
    const ALLOWED_KEYS: &[&str] = &[
        "type",
        "description",
        "properties",
        "required",
        "enum",
        "items",
        "format",
        "nullable",
    ];

    match schema {
        Value::Object(map) => {
            let clean = map
                .iter()
                .filter(|(key, _)| ALLOWED_KEYS.contains(&key.as_str()))
                .map(|(key, value)| {
                    let cleaned = match (key.as_str(), value) {
                        ("properties", Value::Object(props)) => Value::Object(
                            props
                                .iter()
                                .map(|(k, v)| (k.clone(), sanitize_schema(v)))
                                .collect(),
                        ),
                        ("items", v) => sanitize_schema(v),
                        (_, v) => v.clone(),
                    };
                    (key.clone(), cleaned)
                })
                .collect();
            Value::Object(clean)
        }
        other => other.clone(),
    }
}

fn parse_finish_reason(reason: &str) -> StopReason {
    match reason {
        "STOP" => StopReason::EndTurn,
        "MAX_TOKENS" => StopReason::MaxTokens,
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII" => {
            StopReason::ContentFilter
        }
        _ => StopReason::Other,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Gemini API Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
    response_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    uri: String,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;
    use wiremock::matchers::{header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(server: &MockServer) -> GeminiBackend {
        let config = GeminiConfig::new("test-key")
            .with_base_url(server.uri())
            .with_max_retries(1)
            .with_retry_backoff(Duration::from_millis(1));
        GeminiBackend::new(config).unwrap()
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new("gemini-2.0-flash-exp", vec![Message::user("hello")], 256)
    }

    fn text_body(text: &str) -> Value {
        serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 5},
            "modelVersion": "gemini-2.0-flash-exp",
            "responseId": "resp-1"
        })
    }

    #[test]
    fn test_config_defaults() {
        let config = GeminiConfig::new("key");
        assert_eq!(config.base_url, DEFAULT_GEMINI_BASE);
        assert_eq!(config.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.name, "gemini");
    }

    #[test]
    fn test_config_debug_redacts_key() {
        let config = GeminiConfig::new("super-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(
            GeminiBackend::new(GeminiConfig::new("  ")),
            Err(LlmError::Config(_))
        ));
    }

    #[test]
    fn test_generate_url() {
        let backend =
            GeminiBackend::new(GeminiConfig::new("k").with_base_url("http://x/v1beta/")).unwrap();
        assert_eq!(
            backend.generate_url("gemini-1.5-pro"),
            "http://x/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let req = request()
            .with_system("be brief")
            .with_temperature(0.1)
            .with_web_search()
            .with_json_schema(serde_json::json!({
                "type": "object",
                "additionalProperties": false,
                "properties": {"x": {"type": "string", "minLength": 1}}
            }));

        let body = serde_json::to_value(GeminiBackend::to_gemini_request(&req)).unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 256);
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        let schema = &body["generationConfig"]["responseSchema"];
        assert!(schema.get("additionalProperties").is_none());
        assert!(schema["properties"]["x"].get("minLength").is_none());
        assert_eq!(body["tools"][0], serde_json::json!({"google_search": {}}));
    }

    #[test]
    fn test_request_body_plain_text_omits_optional_fields() {
        let body = serde_json::to_value(GeminiBackend::to_gemini_request(&request())).unwrap();
        assert!(body.get("systemInstruction").is_none());
        assert!(body.get("tools").is_none());
        assert!(body["generationConfig"].get("responseSchema").is_none());
    }

    #[test]
    fn test_sanitize_schema_recurses_into_items() {
        let schema = serde_json::json!({
            "type": "array",
            "title": "queries",
            "items": {"type": "string", "pattern": "^.+$"}
        });
        let clean = sanitize_schema(&schema);
        assert!(clean.get("title").is_none());
        assert_eq!(clean["items"], serde_json::json!({"type": "string"}));
    }

    #[tokio::test]
    async fn test_complete_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash-exp:generateContent"))
            .and(header_eq("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_body("hi there")))
            .expect(1)
            .mount(&server)
            .await;

        let response = backend_for(&server).complete(request()).await.unwrap();

        assert_eq!(response.text(), "hi there");
        assert_eq!(response.id, "resp-1");
        assert_eq!(response.usage, Usage::new(12, 5));
        assert_eq!(response.stop_reason, Some(StopReason::EndTurn));
        assert!(response.citations.is_empty());
    }

    #[tokio::test]
    async fn test_empty_request_model_uses_config_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash-exp:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_body("ok")))
            .expect(1)
            .mount(&server)
            .await;

        let req = CompletionRequest::new("", vec![Message::user("x")], 10);
        assert!(backend_for(&server).complete(req).await.is_ok());
    }

    #[tokio::test]
    async fn test_grounding_chunks_become_citations() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": "part one "}, {"text": "part two"}]},
                "finishReason": "STOP",
                "groundingMetadata": {
                    "groundingChunks": [
                        {"web": {"uri": "https://a.example", "title": "A"}},
                        {"web": {"uri": "https://b.example", "title": "  "}},
                        {"web": {"uri": ""}},
                        {"retrievedContext": {}}
                    ]
                }
            }]
        });
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let response = backend_for(&server)
            .complete(request().with_web_search())
            .await
            .unwrap();

        assert_eq!(response.text(), "part one part two");
        assert_eq!(
            response.citations,
            vec![
                Citation::new("https://a.example").with_title("A"),
                Citation::new("https://b.example"),
            ]
        );
    }

    #[tokio::test]
    async fn test_blocked_prompt_is_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
            .mount(&server)
            .await;

        let err = backend_for(&server).complete(request()).await.unwrap_err();
        assert!(matches!(err, LlmError::Backend(ref m) if m.contains("SAFETY")));
    }

    #[tokio::test]
    async fn test_missing_candidates_is_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let err = backend_for(&server).complete(request()).await.unwrap_err();
        assert!(matches!(err, LlmError::Backend(_)));
    }

    #[tokio::test]
    async fn test_auth_error_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": {"code": 403, "message": "API key not valid"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = backend_for(&server).complete(request()).await.unwrap_err();
        assert!(matches!(err, LlmError::Auth(ref m) if m.contains("API key not valid")));
    }

    #[tokio::test]
    async fn test_server_error_retried_then_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .expect(2)
            .mount(&server)
            .await;

        let err = backend_for(&server).complete(request()).await.unwrap_err();
        assert!(matches!(err, LlmError::Network(_)));
    }

    #[tokio::test]
    async fn test_rate_limit_carries_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "0")
                    .set_body_json(serde_json::json!({
                        "error": {"code": 429, "message": "Resource exhausted"}
                    })),
            )
            .mount(&server)
            .await;

        let err = backend_for(&server).complete(request()).await.unwrap_err();
        assert_eq!(err.retry_after(), Some(Duration::from_secs(0)));
        assert!(err.to_string().contains("Resource exhausted"));
    }
}
