//! CLI command handlers.

pub mod config;
pub mod research;
pub mod tools;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use delve_config::{LoadedConfig, ResearchSection};
use delve_llm::{GeminiBackend, GeminiConfig, SharedBackend};
use delve_research::ResearchConfig;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Merged configuration and its provenance.
    pub loaded: LoadedConfig,
    /// Resolved user configuration directory, if any.
    pub config_dir: Option<PathBuf>,
    /// Verbose output enabled.
    pub verbose: bool,
}

/// Session settings from the `[research]` section over the defaults.
pub fn research_config(section: &ResearchSection) -> ResearchConfig {
    let mut config = ResearchConfig::default();
    if let Some(model) = &section.model {
        config = config.with_model(model.clone());
    }
    if let Some(t) = section.search_temperature {
        config = config.with_search_temperature(t);
    }
    if let Some(t) = section.analysis_temperature {
        config = config.with_analysis_temperature(t);
    }
    if let Some(n) = section.max_iterations {
        config = config.with_max_iterations(n);
    }
    config
}

/// Build the Gemini backend from the `[gemini]` section and resolved key.
pub fn gemini_backend(ctx: &Context, model: &str) -> Result<SharedBackend> {
    let section = ctx.loaded.config.gemini();
    let secret = delve_config::require_api_key(section.api_key.as_deref())?;
    tracing::debug!(source = %secret.source, "Resolved API key");

    let mut config = GeminiConfig::new(secret.value).with_model(model);
    if let Some(url) = section.base_url {
        config = config.with_base_url(url);
    }
    if let Some(secs) = section.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    if let Some(retries) = section.max_retries {
        config = config.with_max_retries(retries);
    }
    if let Some(ms) = section.retry_backoff_ms {
        config = config.with_retry_backoff(Duration::from_millis(ms));
    }

    Ok(Arc::new(GeminiBackend::new(config)?))
}
