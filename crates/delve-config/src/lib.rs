//! Configuration system for Delve.
//!
//! Provides TOML-based configuration with:
//! - `[research]`, `[gemini]` and `[logging]` sections
//! - Config file layering (user config dir + project-local overrides)
//! - API key resolution (env var → config file)

pub mod discovery;
pub mod error;
pub mod secrets;
pub mod types;

pub use discovery::{
    CONFIG_DIR_ENV, ConfigSource, LoadedConfig, load_config_file,
    load_config_with_options, user_config_dir, user_config_path,
};
pub use error::{ConfigError, Result};
pub use secrets::{API_KEY_ENV, ResolvedSecret, SecretSource, require_api_key, resolve_api_key};
pub use types::*;
