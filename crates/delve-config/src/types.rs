//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [research]   # model, temperatures, iteration bound
//! [gemini]     # endpoint, credentials, retry policy
//! [logging]    # log level and file output
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Model identifiers the research engine is tuned for.
pub const KNOWN_MODELS: &[&str] = &[
    "gemini-2.0-flash-exp",
    "gemini-2.0-lite",
    "gemini-1.5-pro",
    "gemini-1.5-flash",
];

/// Returns true if `model` is one of [`KNOWN_MODELS`].
pub fn is_known_model(model: &str) -> bool {
    KNOWN_MODELS.contains(&model)
}

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelveConfig {
    /// Research session defaults.
    pub research: Option<ResearchSection>,

    /// Gemini provider settings.
    pub gemini: Option<GeminiSection>,

    /// Logging settings.
    pub logging: Option<LoggingSection>,
}

impl DelveConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Merging is per field, so a project file that only sets
    /// `research.max_iterations` keeps the user file's model.
    pub fn merge(&mut self, other: DelveConfig) {
        merge_section(&mut self.research, other.research, ResearchSection::merge);
        merge_section(&mut self.gemini, other.gemini, GeminiSection::merge);
        merge_section(&mut self.logging, other.logging, LoggingSection::merge);
    }

    /// Research section, or defaults.
    pub fn research(&self) -> ResearchSection {
        self.research.clone().unwrap_or_default()
    }

    /// Gemini section, or defaults.
    pub fn gemini(&self) -> GeminiSection {
        self.gemini.clone().unwrap_or_default()
    }

    /// Logging section, or defaults.
    pub fn logging(&self) -> LoggingSection {
        self.logging.clone().unwrap_or_default()
    }
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: fn(&mut T, T)) {
    match (base.as_mut(), other) {
        (Some(existing), Some(layer)) => merge(existing, layer),
        (None, Some(layer)) => *base = Some(layer),
        (_, None) => {}
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sections
// ─────────────────────────────────────────────────────────────────────────────

/// The `[research]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchSection {
    /// Model identifier.
    pub model: Option<String>,
    /// Temperature for search-grounded calls.
    pub search_temperature: Option<f32>,
    /// Temperature for reflection and evaluation.
    pub analysis_temperature: Option<f32>,
    /// Maximum reflection rounds (1-5).
    pub max_iterations: Option<u32>,
}

impl ResearchSection {
    fn merge(&mut self, other: ResearchSection) {
        if other.model.is_some() {
            self.model = other.model;
        }
        if other.search_temperature.is_some() {
            self.search_temperature = other.search_temperature;
        }
        if other.analysis_temperature.is_some() {
            self.analysis_temperature = other.analysis_temperature;
        }
        if other.max_iterations.is_some() {
            self.max_iterations = other.max_iterations;
        }
    }

    /// Check ranges of the values that are set.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("research.search_temperature", self.search_temperature),
            ("research.analysis_temperature", self.analysis_temperature),
        ] {
            if let Some(t) = value
                && !(0.0..=1.0).contains(&t)
            {
                return Err(ConfigError::invalid(field, format!("{} is not in [0, 1]", t)));
            }
        }
        if let Some(n) = self.max_iterations
            && !(1..=5).contains(&n)
        {
            return Err(ConfigError::invalid(
                "research.max_iterations",
                format!("{} is not in [1, 5]", n),
            ));
        }
        Ok(())
    }
}

/// The `[gemini]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSection {
    /// API key (plaintext; prefer `GEMINI_API_KEY`).
    pub api_key: Option<String>,
    /// Override for the API base URL.
    pub base_url: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Retries for transient failures.
    pub max_retries: Option<u32>,
    /// Initial retry backoff in milliseconds.
    pub retry_backoff_ms: Option<u64>,
}

impl GeminiSection {
    fn merge(&mut self, other: GeminiSection) {
        if other.api_key.is_some() {
            self.api_key = other.api_key;
        }
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.max_retries.is_some() {
            self.max_retries = other.max_retries;
        }
        if other.retry_backoff_ms.is_some() {
            self.retry_backoff_ms = other.retry_backoff_ms;
        }
    }

    /// Whether a non-empty API key is stored in the file.
    pub fn has_plaintext_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// The `[logging]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Default filter directive (e.g. "info", "delve_research=debug").
    pub level: Option<String>,
    /// Whether to write the JSON log file.
    pub file: Option<bool>,
    /// Directory for log files. Defaults to `<config dir>/logs`.
    pub directory: Option<PathBuf>,
}

impl LoggingSection {
    fn merge(&mut self, other: LoggingSection) {
        if other.level.is_some() {
            self.level = other.level;
        }
        if other.file.is_some() {
            self.file = other.file;
        }
        if other.directory.is_some() {
            self.directory = other.directory;
        }
    }

    /// Whether file logging is enabled (default on).
    pub fn file_enabled(&self) -> bool {
        self.file.unwrap_or(true)
    }
}
