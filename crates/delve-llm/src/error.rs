//! Error types for the LLM crate.

use std::time::Duration;
use thiserror::Error;

/// Result type alias using the LLM error type.
pub type Result<T> = std::result::Result<T, LlmError>;

// ─────────────────────────────────────────────────────────────────────────────
// Rate Limit Info
// ─────────────────────────────────────────────────────────────────────────────

/// A 429 from the provider, with the wait it asked for.
#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    pub message: String,
    /// Parsed from the `Retry-After` header (delay-seconds form only).
    pub retry_after: Option<Duration>,
}

impl RateLimitInfo {
    /// Build rate limit info from a response body and an optional `Retry-After` header.
    pub fn from_response(message: &str, retry_after_header: Option<&str>) -> Self {
        Self {
            message: message.to_string(),
            retry_after: retry_after_header
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs),
        }
    }
}

impl std::fmt::Display for RateLimitInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(retry_after) = self.retry_after {
            write!(f, " (retry after {:.2}s)", retry_after.as_secs_f64())?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Response Validation Errors
// ─────────────────────────────────────────────────────────────────────────────

/// A successful HTTP response that still carried no usable completion.
#[derive(Debug, Clone, Error)]
pub enum ResponseValidationError {
    #[error("response contained no candidates")]
    NoCandidates,

    /// Either `promptFeedback.blockReason` or a `SAFETY` finish with no text.
    #[error("prompt blocked by provider: {reason}")]
    Blocked { reason: String },
}

impl ResponseValidationError {
    pub fn blocked(reason: impl Into<String>) -> Self {
        Self::Blocked {
            reason: reason.into(),
        }
    }
}

impl From<ResponseValidationError> for LlmError {
    fn from(err: ResponseValidationError) -> Self {
        LlmError::Backend(err.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LlmError
// ─────────────────────────────────────────────────────────────────────────────

/// Error type for LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Provider rejected or could not answer the request.
    #[error("Backend error: {0}")]
    Backend(String),

    /// Connectivity failure or provider 5xx (retryable).
    #[error("Network error: {0}")]
    Network(String),

    /// Missing API key or unusable client settings.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The provider answered 400.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Rate limit exceeded (retryable with backoff).
    #[error("Rate limit exceeded: {0}")]
    RateLimit(RateLimitInfo),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LlmError {
    /// Classify a non-success HTTP status from the provider.
    pub fn from_status(status: u16, message: String, retry_after_header: Option<&str>) -> Self {
        match status {
            401 | 403 => Self::Auth(format!("Authentication failed: {}", message)),
            429 => Self::RateLimit(RateLimitInfo::from_response(&message, retry_after_header)),
            400 => Self::InvalidRequest(message),
            500..=599 => Self::Network(format!("Server error: {}", message)),
            _ => Self::Backend(message),
        }
    }

    /// The wait requested by a rate-limited provider, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimit(info) => info.retry_after,
            _ => None,
        }
    }

    /// Network failures and rate limits are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RateLimit(_))
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Network(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            LlmError::Network(format!("Connection failed: {}", err))
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::Serialization(err.to_string())
    }
}
