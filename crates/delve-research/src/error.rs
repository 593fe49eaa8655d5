//! Error types for the research crate.

use thiserror::Error;

use crate::model::DecodeError;

/// Result type alias using the research error type.
pub type Result<T> = std::result::Result<T, ResearchError>;

/// Error type for research operations.
#[derive(Debug, Error)]
pub enum ResearchError {
    /// LLM backend error.
    #[error("LLM error: {0}")]
    Llm(#[from] delve_llm::LlmError),

    /// Structured model output did not match its declared shape.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Invalid session configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tool not found in registry.
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Invalid tool parameters.
    #[error("Invalid tool parameters: {0}")]
    InvalidToolParams(String),
}

impl ResearchError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
