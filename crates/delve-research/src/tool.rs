//! Tool framework for hosting research capabilities.
//!
//! A host (the CLI, or an agent runtime) looks tools up by name in a
//! [`ToolRegistry`] and invokes them with JSON parameters:
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use delve_research::tool::{Tool, ToolContext, ToolResult};
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl Tool for Echo {
//!     fn name(&self) -> &str { "echo" }
//!     fn description(&self) -> &str { "Repeats its input" }
//!     fn parameters(&self) -> serde_json::Value { serde_json::json!({"type": "string"}) }
//!     async fn execute(&self, params: serde_json::Value, _ctx: &ToolContext) -> Result<ToolResult> {
//!         Ok(ToolResult::text(params.to_string()))
//!     }
//! }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{ResearchError, Result};
use crate::types::SessionId;

// ─────────────────────────────────────────────────────────────────────────────
// Tool Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A capability exposed to a host by name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the unique name of this tool.
    fn name(&self) -> &str;

    /// Get a human-readable description of what this tool does.
    fn description(&self) -> &str;

    /// Get the JSON Schema for this tool's parameters.
    fn parameters(&self) -> serde_json::Value;

    /// Execute the tool with the given parameters.
    ///
    /// Failures the caller should see go in [`ToolResult::Error`]; an `Err`
    /// means the tool could not run at all.
    async fn execute(&self, params: serde_json::Value, ctx: &ToolContext) -> Result<ToolResult>;
}

/// Name, description and parameter schema of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool Context
// ─────────────────────────────────────────────────────────────────────────────

/// Context provided to tools during execution.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// ID of the session this tool is running in.
    pub session_id: SessionId,
    /// Token to check for cancellation.
    pub cancellation: CancellationToken,
}

impl ToolContext {
    /// Create a new tool context.
    pub fn new(session_id: SessionId) -> Self {
        Self::with_cancellation(session_id, CancellationToken::new())
    }

    /// Create a context with a cancellation token.
    pub fn with_cancellation(session_id: SessionId, cancellation: CancellationToken) -> Self {
        Self {
            session_id,
            cancellation,
        }
    }

    /// Check if execution has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

impl Default for ToolContext {
    fn default() -> Self {
        Self::new(SessionId::new())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool Result
// ─────────────────────────────────────────────────────────────────────────────

/// Result of a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolResult {
    /// Successful text output.
    Text {
        /// The text content.
        content: String,
    },
    /// Tool execution failed.
    Error {
        /// Error message.
        message: String,
        /// Whether retrying could succeed.
        recoverable: bool,
    },
}

impl ToolResult {
    /// Create a text result.
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    /// Create a recoverable error result.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            recoverable: true,
        }
    }

    /// Create a non-recoverable error result.
    pub fn fatal_error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            recoverable: false,
        }
    }

    /// Check if this result is an error.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// The text or error message, unadorned.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text { content } => content,
            Self::Error { message, .. } => message,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Tools available to a host, keyed by name.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool.
    ///
    /// If a tool with the same name already exists, it will be replaced.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = tool.name().to_string();
        tracing::debug!(tool = %name, "Registered tool");
        self.tools.insert(name, Arc::new(tool));
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Tool names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Execute a tool by name.
    pub async fn execute(
        &self,
        name: &str,
        params: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolResult> {
        let tool = self
            .get(name)
            .ok_or_else(|| ResearchError::ToolNotFound(name.to_string()))?;

        tracing::info!(tool = %name, session_id = %ctx.session_id, "Executing tool");
        let result = tool.execute(params, ctx).await?;
        if result.is_error() {
            tracing::warn!(tool = %name, message = %result.as_str(), "Tool returned an error");
        }
        Ok(result)
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Upper;

    #[async_trait]
    impl Tool for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn description(&self) -> &str {
            "Upper-cases text"
        }

        fn parameters(&self) -> serde_json::Value {
            json!({"type": "object", "properties": {"text": {"type": "string"}}})
        }

        async fn execute(
            &self,
            params: serde_json::Value,
            ctx: &ToolContext,
        ) -> Result<ToolResult> {
            if ctx.is_cancelled() {
                return Ok(ToolResult::error("Operation cancelled"));
            }
            match params.get("text").and_then(|v| v.as_str()) {
                Some(text) => Ok(ToolResult::text(text.to_uppercase())),
                None => Err(ResearchError::InvalidToolParams("text is required".into())),
            }
        }
    }

    #[tokio::test]
    async fn test_registry_execute() {
        let mut registry = ToolRegistry::new();
        registry.register(Upper);

        let result = registry
            .execute("upper", json!({"text": "hi"}), &ToolContext::default())
            .await
            .unwrap();
        assert_eq!(result, ToolResult::text("HI"));
        assert!(!result.is_error());
    }

    #[tokio::test]
    async fn test_registry_unknown_tool() {
        let registry = ToolRegistry::new();
        let err = registry
            .execute("missing", json!({}), &ToolContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ResearchError::ToolNotFound(name) if name == "missing"));
    }

    #[tokio::test]
    async fn test_cancelled_context() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = ToolContext::with_cancellation(SessionId::new(), token);

        let result = Upper.execute(json!({"text": "hi"}), &ctx).await.unwrap();
        assert!(result.is_error());
        assert_eq!(result.as_str(), "Operation cancelled");
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Upper);
        registry.register(Upper);

        assert_eq!(registry.names(), vec!["upper"]);
        assert!(registry.get("upper").is_some());
        assert!(registry.get("lower").is_none());
    }

    #[test]
    fn test_result_serialization() {
        let json = serde_json::to_value(ToolResult::fatal_error("boom")).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["recoverable"], false);
        assert_eq!(ToolResult::text("x").as_str(), "x");
    }
}
