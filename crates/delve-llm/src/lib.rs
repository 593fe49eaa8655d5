//! LLM client abstraction for Delve.
//!
//! This crate provides a provider-agnostic interface for single-shot
//! completions, with optional JSON-schema constrained output and web-search
//! grounding.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  LlmBackend trait                       │
//! │  - complete() -> CompletionResponse     │
//! └─────────────────────────────────────────┘
//!                    │
//!          ┌─────────┴─────────┐
//!          ▼                   ▼
//!     ┌────────┐         ┌────────────┐
//!     │ Gemini │         │ MockBackend│ (tests)
//!     └────────┘         └────────────┘
//! ```

pub mod backend;
pub mod error;
pub mod types;

// Provider implementations
pub mod gemini;

pub use backend::{LlmBackend, SharedBackend, with_retry};
pub use error::{LlmError, RateLimitInfo, ResponseValidationError, Result};
pub use types::{
    Citation, CompletionRequest, CompletionResponse, ContentBlock, Message, ResponseFormat, Role,
    StopReason, Usage,
};

#[cfg(any(test, feature = "testing"))]
pub use backend::MockBackend;

// Re-export provider configs
pub use gemini::{DEFAULT_GEMINI_MODEL, GeminiBackend, GeminiConfig};
