//! Language-model adapter used by every research component.
//!
//! Wraps a [`SharedBackend`] with the session's model and token cap and
//! offers three call shapes: plain text, search-grounded text, and
//! structured output decoded into a [`StructuredOutput`] type.

use delve_llm::{Citation, CompletionRequest, Message, SharedBackend};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::{DEFAULT_MODEL, ResearchConfig};
use crate::error::Result;

// ─────────────────────────────────────────────────────────────────────────────
// Structured Output Contract
// ─────────────────────────────────────────────────────────────────────────────

/// Structured model output that failed to match its declared shape.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// The model returned no content.
    #[error("model returned an empty response")]
    Empty,

    /// The content is not valid JSON for the expected shape.
    #[error("malformed structured output: {0}")]
    Malformed(String),

    /// A numeric field is outside its allowed range.
    #[error("field '{field}' out of range: {value}")]
    OutOfRange { field: &'static str, value: String },

    /// A field that must have entries is empty.
    #[error("field '{0}' must not be empty")]
    EmptyField(&'static str),
}

/// A type the model can be asked to produce as JSON.
pub trait StructuredOutput: DeserializeOwned {
    /// JSON Schema sent to the model.
    fn schema() -> serde_json::Value;

    /// Semantic checks serde cannot express.
    fn validate(&self) -> std::result::Result<(), DecodeError> {
        Ok(())
    }
}

/// Decode model text into `T`, tolerating a surrounding Markdown code fence.
pub fn decode_structured<T: StructuredOutput>(text: &str) -> std::result::Result<T, DecodeError> {
    let body = strip_code_fences(text);
    if body.is_empty() {
        return Err(DecodeError::Empty);
    }
    let value: T =
        serde_json::from_str(body).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    value.validate()?;
    Ok(value)
}

/// Remove an optional ```` ```json ```` / ```` ``` ```` wrapper.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    // Any other info string runs to the first newline.
    let rest = match rest.find('\n') {
        Some(idx) if !rest[..idx].trim_start().starts_with(['{', '[']) => &rest[idx + 1..],
        _ => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

// ─────────────────────────────────────────────────────────────────────────────
// Language Model
// ─────────────────────────────────────────────────────────────────────────────

/// Text returned by a search-grounded call.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundedText {
    /// Response fragments joined with newlines.
    pub content: String,
    /// Web sources reported by the provider.
    pub sources: Vec<Citation>,
}

/// A backend bound to one session's model settings.
#[derive(Clone)]
pub struct LanguageModel {
    backend: SharedBackend,
    model: String,
    max_tokens: u32,
}

impl LanguageModel {
    /// Bind a backend to the model named in `config`.
    ///
    /// An empty model name falls back to the backend's default.
    pub fn new(backend: SharedBackend, config: &ResearchConfig) -> Self {
        let model = if config.model.trim().is_empty() {
            backend
                .default_model()
                .unwrap_or(DEFAULT_MODEL)
                .to_string()
        } else {
            config.model.clone()
        };
        Self {
            backend,
            model,
            max_tokens: config.max_tokens,
        }
    }

    /// Model identifier used for requests.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Name of the underlying backend.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    fn request(&self, prompt: impl Into<String>, temperature: f32) -> CompletionRequest {
        CompletionRequest::new(&self.model, vec![Message::user(prompt)], self.max_tokens)
            .with_temperature(temperature)
    }

    /// Free-text completion.
    pub async fn invoke(&self, prompt: impl Into<String>, temperature: f32) -> Result<String> {
        let response = self.backend.complete(self.request(prompt, temperature)).await?;
        Ok(response.text())
    }

    /// Completion grounded with live web search.
    pub async fn invoke_with_search(
        &self,
        prompt: impl Into<String>,
        temperature: f32,
    ) -> Result<GroundedText> {
        let request = self.request(prompt, temperature).with_web_search();
        let response = self.backend.complete(request).await?;
        Ok(GroundedText {
            content: response.joined_text("\n"),
            sources: response.citations,
        })
    }

    /// Completion decoded into `T` against `T::schema()`.
    pub async fn invoke_structured<T: StructuredOutput>(
        &self,
        prompt: impl Into<String>,
        temperature: f32,
    ) -> Result<T> {
        let request = self
            .request(prompt, temperature)
            .with_json_schema(T::schema());
        let response = self.backend.complete(request).await?;
        Ok(decode_structured(&response.text())?)
    }
}

impl std::fmt::Debug for LanguageModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageModel")
            .field("backend", &self.backend.name())
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}
