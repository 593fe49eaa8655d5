//! Built-in tools.
//!
//! - `analyze`: multi-iteration web research producing a Markdown report

mod analyze;

pub use analyze::{AnalyzeParams, AnalyzeTool};

use crate::tool::{ToolDefinition, ToolRegistry};

/// Registry holding every built-in tool.
pub fn default_registry(tool: AnalyzeTool) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(tool);
    registry
}

/// Definitions of every built-in tool, without constructing any of them.
pub fn builtin_definitions() -> Vec<ToolDefinition> {
    vec![AnalyzeTool::definition()]
}
