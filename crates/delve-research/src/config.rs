//! Per-session research settings.

use serde::{Deserialize, Serialize};

use crate::error::{ResearchError, Result};

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

/// Allowed range for `max_iterations`.
pub const MAX_ITERATIONS_RANGE: std::ops::RangeInclusive<u32> = 1..=5;

/// Temperature for intent analysis.
pub const INTENT_TEMPERATURE: f32 = 0.3;

/// Temperature for follow-up query optimization.
pub const OPTIMIZE_TEMPERATURE: f32 = 0.2;

/// Temperature for final suggestions.
pub const SUGGESTION_TEMPERATURE: f32 = 0.5;

/// Settings supplied when an orchestrator is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    /// Model identifier passed through to the backend. Empty means the
    /// backend's own default.
    pub model: String,
    /// Temperature for search-grounded calls.
    pub search_temperature: f32,
    /// Temperature for reflection and evaluation.
    pub analysis_temperature: f32,
    /// Upper bound on reflection rounds.
    pub max_iterations: u32,
    /// Output token cap for every model call.
    pub max_tokens: u32,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            search_temperature: 0.1,
            analysis_temperature: 0.3,
            max_iterations: 2,
            max_tokens: 8192,
        }
    }
}

impl ResearchConfig {
    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the search temperature.
    pub fn with_search_temperature(mut self, temperature: f32) -> Self {
        self.search_temperature = temperature;
        self
    }

    /// Set the analysis temperature.
    pub fn with_analysis_temperature(mut self, temperature: f32) -> Self {
        self.analysis_temperature = temperature;
        self
    }

    /// Set the iteration bound.
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Check that every value is in range.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("search_temperature", self.search_temperature),
            ("analysis_temperature", self.analysis_temperature),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ResearchError::config(format!(
                    "{} must be between 0 and 1, got {}",
                    name, value
                )));
            }
        }
        if !MAX_ITERATIONS_RANGE.contains(&self.max_iterations) {
            return Err(ResearchError::config(format!(
                "max_iterations must be between {} and {}, got {}",
                MAX_ITERATIONS_RANGE.start(),
                MAX_ITERATIONS_RANGE.end(),
                self.max_iterations
            )));
        }
        if self.max_tokens == 0 {
            return Err(ResearchError::config("max_tokens must be positive"));
        }
        Ok(())
    }
}
