//! LLM Backend trait and implementations.
//!
//! This module defines the abstraction layer over language-model providers
//! and, for tests, a scripted mock backend.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::types::{CompletionRequest, CompletionResponse};

// ─────────────────────────────────────────────────────────────────────────────
// Shared Retry Logic
// ─────────────────────────────────────────────────────────────────────────────

/// Execute an async operation with exponential backoff retry.
///
/// Retries only on transient errors (network failures and rate limits).
/// Non-retryable errors are returned immediately. A rate limit that carries a
/// retry-after hint waits for that long instead of the current backoff.
pub async fn with_retry<F, Fut, T>(
    max_retries: u32,
    initial_backoff: Duration,
    backend_name: &str,
    mut f: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut backoff = initial_backoff;
    let mut attempt = 0;

    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !e.is_retryable() || attempt >= max_retries {
                    return Err(e);
                }

                let wait = e.retry_after().unwrap_or(backoff);
                attempt += 1;
                tracing::warn!(
                    backend = backend_name,
                    attempt = attempt,
                    max_retries = max_retries,
                    backoff_ms = wait.as_millis() as u64,
                    error = %e,
                    "Request failed, retrying"
                );
                tokio::time::sleep(wait).await;
                backoff *= 2;
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LLM Backend Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for LLM backend providers.
///
/// Implementations provide the actual connection to a hosted model. Research
/// components only ever see this trait, so tests can swap in [`MockBackend`].
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Execute a completion request and return the full response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// Model used when a caller has no preference.
    fn default_model(&self) -> Option<&str> {
        None
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared Backend Type
// ─────────────────────────────────────────────────────────────────────────────

/// A backend that can be shared across threads.
pub type SharedBackend = Arc<dyn LlmBackend>;

// ─────────────────────────────────────────────────────────────────────────────
// Mock Backend
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(any(test, feature = "testing"))]
pub use mock::MockBackend;

#[cfg(any(test, feature = "testing"))]
mod mock {
    use super::*;
    use crate::error::LlmError;
    use crate::types::{ContentBlock, StopReason, Usage};
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// A mock backend for testing purposes.
    ///
    /// Returns pre-scripted results in order, so a test can interleave
    /// successful completions with provider failures.
    #[derive(Debug)]
    pub struct MockBackend {
        name: String,
        responses: Mutex<VecDeque<Result<CompletionResponse>>>,
        request_log: Mutex<Vec<CompletionRequest>>,
    }

    impl MockBackend {
        /// Create a mock backend with the given scripted results.
        ///
        /// Once the script is exhausted every further call fails with a
        /// backend error.
        pub fn new(responses: Vec<Result<CompletionResponse>>) -> Self {
            Self {
                name: "mock".to_string(),
                responses: Mutex::new(responses.into()),
                request_log: Mutex::new(Vec::new()),
            }
        }

        /// Create a mock backend that answers each call with the next text.
        pub fn with_texts<I, S>(texts: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self::new(texts.into_iter().map(|t| Ok(Self::text_response(t))).collect())
        }

        /// Create a mock backend with a single text response.
        pub fn with_text(text: impl Into<String>) -> Self {
            Self::with_texts([text])
        }

        /// Create a mock backend with a single JSON response.
        pub fn with_json(value: serde_json::Value) -> Self {
            Self::with_text(value.to_string())
        }

        /// Create a mock backend whose every call fails.
        pub fn failing() -> Self {
            Self::new(Vec::new())
        }

        /// Build a plain text completion.
        pub fn text_response(text: impl Into<String>) -> CompletionResponse {
            CompletionResponse::new(
                "mock_msg",
                "mock-model",
                vec![ContentBlock::text(text)],
                StopReason::EndTurn,
                Usage::new(10, 20),
            )
        }

        /// Get all requests that were made to this backend.
        pub fn requests(&self) -> Vec<CompletionRequest> {
            self.request_log.lock().clone()
        }

        /// Get the number of requests made.
        pub fn request_count(&self) -> usize {
            self.request_log.lock().len()
        }
    }

    #[async_trait]
    impl LlmBackend for MockBackend {
        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
            self.request_log.lock().push(request);

            self.responses.lock().pop_front().unwrap_or_else(|| {
                Err(LlmError::Backend(
                    "MockBackend: no more responses available".to_string(),
                ))
            })
        }

        fn name(&self) -> &str {
            &self.name
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
