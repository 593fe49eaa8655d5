//! Analyze tool: iterative web research on a single query.

use async_trait::async_trait;
use serde_json::{Value, json};

use delve_llm::SharedBackend;

use crate::config::ResearchConfig;
use crate::error::{ResearchError, Result};
use crate::orchestrator::{EMPTY_QUERY_MESSAGE, ResearchOrchestrator};
use crate::tool::{Tool, ToolContext, ToolDefinition, ToolResult};

// ─────────────────────────────────────────────────────────────────────────────
// Parameters
// ─────────────────────────────────────────────────────────────────────────────

/// Validated parameters for the analyze tool.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeParams {
    /// The research query; may be blank.
    pub query: String,
}

impl TryFrom<Value> for AnalyzeParams {
    type Error = ResearchError;

    /// Accepts `{"query": "..."}` or a bare JSON string. A missing query is
    /// treated as blank.
    fn try_from(params: Value) -> std::result::Result<Self, Self::Error> {
        let query = match params {
            Value::String(query) => query,
            Value::Null => String::new(),
            Value::Object(mut map) => match map.remove("query") {
                Some(Value::String(query)) => query,
                None | Some(Value::Null) => String::new(),
                Some(other) => {
                    return Err(ResearchError::InvalidToolParams(format!(
                        "'query' must be a string, got {}",
                        other
                    )));
                }
            },
            other => {
                return Err(ResearchError::InvalidToolParams(format!(
                    "expected an object with a 'query' string, got {}",
                    other
                )));
            }
        };
        Ok(Self { query })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Analyze Tool
// ─────────────────────────────────────────────────────────────────────────────

/// Runs a full research session per invocation.
///
/// The backend is shared across invocations; every call gets a fresh
/// orchestrator, so no session state outlives its call.
#[derive(Clone)]
pub struct AnalyzeTool {
    backend: SharedBackend,
    config: ResearchConfig,
}

impl AnalyzeTool {
    pub const NAME: &'static str = "analyze";

    const DESCRIPTION: &'static str = "Perform comprehensive multi-step research on a topic. Analyzes the intent behind the query, runs batched web searches, reflects on gaps over several iterations, and returns a Markdown report with recommendations.";

    /// Create the tool over a pre-built backend.
    pub fn new(backend: SharedBackend, config: ResearchConfig) -> Self {
        Self { backend, config }
    }

    /// Name, description and parameter schema; needs no backend.
    pub fn definition() -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: Self::DESCRIPTION.to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The research question or topic to analyze"
                    }
                },
                "required": ["query"]
            }),
        }
    }
}

impl std::fmt::Debug for AnalyzeTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzeTool")
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .finish()
    }
}

#[async_trait]
impl Tool for AnalyzeTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        Self::DESCRIPTION
    }

    fn parameters(&self) -> Value {
        Self::definition().parameters
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolResult> {
        if ctx.is_cancelled() {
            return Ok(ToolResult::error("Operation cancelled"));
        }

        let params = match AnalyzeParams::try_from(params) {
            Ok(p) => p,
            Err(e) => return Ok(ToolResult::error(e.to_string())),
        };
        if params.query.trim().is_empty() {
            return Ok(ToolResult::text(EMPTY_QUERY_MESSAGE));
        }

        let built = ResearchOrchestrator::new(self.config.clone(), self.backend.clone());
        let orchestrator = match built {
            Ok(o) => o,
            Err(e) => return Ok(ToolResult::fatal_error(format!("Research failed: {}", e))),
        };

        tracing::info!(session_id = %ctx.session_id, "Starting analysis");

        let query = params.query;
        let handle =
            tokio::spawn(async move { orchestrator.perform_comprehensive_research(&query).await });
        let abort = handle.abort_handle();

        tokio::select! {
            _ = ctx.cancellation.cancelled() => {
                abort.abort();
                tracing::warn!(session_id = %ctx.session_id, "Analysis cancelled");
                Ok(ToolResult::error("Operation cancelled"))
            }
            joined = handle => match joined {
                Ok(report) => Ok(ToolResult::text(report)),
                Err(e) => {
                    tracing::error!(
                        session_id = %ctx.session_id,
                        error = %e,
                        "Analysis task failed"
                    );
                    Ok(ToolResult::fatal_error(format!("Research failed: {}", e)))
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionId;
    use delve_llm::{CompletionRequest, CompletionResponse, LlmBackend, MockBackend};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    struct StalledBackend;

    #[async_trait]
    impl LlmBackend for StalledBackend {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> delve_llm::Result<CompletionResponse> {
            std::future::pending().await
        }

        fn name(&self) -> &str {
            "stalled"
        }
    }

    struct PanickingBackend;

    #[async_trait]
    impl LlmBackend for PanickingBackend {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> delve_llm::Result<CompletionResponse> {
            panic!("backend exploded")
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    fn tool_with(backend: SharedBackend) -> AnalyzeTool {
        AnalyzeTool::new(backend, ResearchConfig::default().with_max_iterations(1))
    }

    #[test]
    fn test_params_parsing() {
        assert_eq!(
            AnalyzeParams::try_from(json!({"query": "rust"})).unwrap().query,
            "rust"
        );
        assert_eq!(AnalyzeParams::try_from(json!("rust")).unwrap().query, "rust");
        assert_eq!(AnalyzeParams::try_from(json!({})).unwrap().query, "");
        assert!(AnalyzeParams::try_from(json!({"query": 5})).is_err());
        assert!(AnalyzeParams::try_from(json!([1, 2])).is_err());
    }

    #[test]
    fn test_metadata() {
        let tool = tool_with(Arc::new(MockBackend::failing()));
        assert_eq!(tool.name(), "analyze");
        assert_eq!(tool.parameters()["required"][0], "query");

        let definition = AnalyzeTool::definition();
        assert_eq!(definition.name, tool.name());
        assert_eq!(definition.description, tool.description());
        assert_eq!(definition.parameters, tool.parameters());
    }

    #[tokio::test]
    async fn test_blank_query() {
        let backend = Arc::new(MockBackend::failing());
        let tool = tool_with(backend.clone());

        let result = tool
            .execute(json!({"query": "  "}), &ToolContext::default())
            .await
            .unwrap();

        assert_eq!(result, ToolResult::text(EMPTY_QUERY_MESSAGE));
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn test_runs_research() {
        let backend = Arc::new(MockBackend::failing());
        let tool = tool_with(backend.clone());

        let result = tool
            .execute(json!("solana fees"), &ToolContext::default())
            .await
            .unwrap();

        assert!(!result.is_error());
        let header = "# 🔬 Advanced Research Analysis\n**Query:** solana fees";
        assert!(result.as_str().starts_with(header));
        assert!(backend.request_count() > 0);
    }

    #[tokio::test]
    async fn test_invalid_params() {
        let tool = tool_with(Arc::new(MockBackend::failing()));
        let result = tool.execute(json!(42), &ToolContext::default()).await.unwrap();
        assert!(result.is_error());
        assert!(result.as_str().starts_with("Invalid tool parameters"));
    }

    #[tokio::test]
    async fn test_invalid_config_reports_failure() {
        let tool = AnalyzeTool::new(
            Arc::new(MockBackend::failing()),
            ResearchConfig::default().with_max_iterations(0),
        );
        let result = tool
            .execute(json!({"query": "q"}), &ToolContext::default())
            .await
            .unwrap();
        assert!(result.as_str().starts_with("Research failed: Configuration error"));
    }

    #[tokio::test]
    async fn test_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = ToolContext::with_cancellation(SessionId::new(), token);
        let backend = Arc::new(MockBackend::failing());

        let result = tool_with(backend.clone())
            .execute(json!({"query": "q"}), &ctx)
            .await
            .unwrap();

        assert_eq!(result, ToolResult::error("Operation cancelled"));
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_mid_run() {
        let token = CancellationToken::new();
        let ctx = ToolContext::with_cancellation(SessionId::new(), token.clone());
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        let result = tool_with(Arc::new(StalledBackend))
            .execute(json!({"query": "q"}), &ctx)
            .await
            .unwrap();

        assert_eq!(result, ToolResult::error("Operation cancelled"));
    }

    #[tokio::test]
    async fn test_panic_becomes_failure_text() {
        let result = tool_with(Arc::new(PanickingBackend))
            .execute(json!({"query": "q"}), &ToolContext::default())
            .await
            .unwrap();

        assert!(result.is_error());
        assert!(result.as_str().starts_with("Research failed:"));
    }
}
