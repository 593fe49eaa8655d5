//! Research core for Delve.
//!
//! This crate turns a single query into a Markdown research report by
//! running a bounded loop of web searches and self-assessment against a
//! language model.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ResearchOrchestrator                                       │
//! │  intent → batch search → reflect (≤ max) → recommendations  │
//! └─────────────────────────────────────────────────────────────┘
//!          │              │               │              │
//!          ▼              ▼               ▼              ▼
//!   ┌────────────┐ ┌────────────┐ ┌──────────────┐ ┌────────────┐
//!   │IntentAnalyz│ │WebSearcher │ │ReflectionEval│ │StepRecorder│
//!   └────────────┘ └────────────┘ └──────────────┘ └────────────┘
//!          └──────────────┼───────────────┘              │
//!                         ▼                              ▼
//!               ┌──────────────────┐             ┌────────────┐
//!               │ LanguageModel    │             │ report     │
//!               │ (delve-llm)      │             │ (Markdown) │
//!               └──────────────────┘             └────────────┘
//! ```
//!
//! # Core Components
//!
//! - [`ResearchOrchestrator`]: the session state machine
//! - [`StepRecorder`]: failure-isolating step log
//! - [`AnalyzeTool`]: the orchestrator exposed through the [`Tool`] trait

pub mod config;
pub mod error;
pub mod fallback;
pub mod intent;
pub mod model;
pub mod orchestrator;
pub mod prompts;
pub mod recorder;
pub mod reflection;
pub mod report;
pub mod search;
pub mod tool;
pub mod tools;
pub mod types;

// Re-export core types
pub use config::{DEFAULT_MODEL, ResearchConfig};
pub use error::{ResearchError, Result};
pub use types::{
    Assessment, IntentAnalysis, NextAction, OptimizedQueries, PrimaryIntent, ReflectionResult,
    SearchEvaluation, SearchResult, SessionId, StepRecord, UserContext, UserIntent,
};

// Re-export components
pub use intent::IntentAnalyzer;
pub use model::{DecodeError, GroundedText, LanguageModel, StructuredOutput};
pub use orchestrator::{EMPTY_QUERY_MESSAGE, ResearchOrchestrator, ResearchOutcome};
pub use recorder::StepRecorder;
pub use reflection::ReflectionEvaluator;
pub use search::WebSearcher;

// Re-export tool types
pub use tool::{Tool, ToolContext, ToolDefinition, ToolRegistry, ToolResult};
pub use tools::{AnalyzeParams, AnalyzeTool, builtin_definitions, default_registry};
