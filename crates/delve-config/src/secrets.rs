//! API key resolution.
//!
//! Resolution order:
//! 1. `GEMINI_API_KEY` environment variable
//! 2. Config file (with warning at load time)

use crate::{ConfigError, Result};

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Result of API key resolution with provenance.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedSecret {
    /// The secret value.
    pub value: String,
    /// Where the secret was found.
    pub source: SecretSource,
}

impl std::fmt::Debug for ResolvedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecret")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .finish()
    }
}

/// Where a secret was resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    /// Environment variable.
    EnvVar(String),
    /// Config file (plaintext, not recommended).
    ConfigFile,
}

impl std::fmt::Display for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretSource::EnvVar(var) => write!(f, "env var {}", var),
            SecretSource::ConfigFile => write!(f, "config file (plaintext)"),
        }
    }
}

/// Resolve the API key, preferring the environment over the config file.
pub fn resolve_api_key(config_value: Option<&str>) -> Option<ResolvedSecret> {
    if let Ok(value) = std::env::var(API_KEY_ENV)
        && !value.is_empty()
    {
        return Some(ResolvedSecret {
            value,
            source: SecretSource::EnvVar(API_KEY_ENV.to_string()),
        });
    }

    config_value
        .filter(|v| !v.is_empty())
        .map(|v| ResolvedSecret {
            value: v.to_string(),
            source: SecretSource::ConfigFile,
        })
}

/// Like [`resolve_api_key`], but a missing key is an error.
pub fn require_api_key(config_value: Option<&str>) -> Result<ResolvedSecret> {
    resolve_api_key(config_value).ok_or_else(|| ConfigError::ApiKeyNotFound {
        env_var: API_KEY_ENV.to_string(),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_env_var_wins_over_config() {
        unsafe { std::env::set_var(API_KEY_ENV, "env-key") };
        let resolved = resolve_api_key(Some("file-key")).unwrap();
        assert_eq!(resolved.value, "env-key");
        assert_eq!(resolved.source, SecretSource::EnvVar(API_KEY_ENV.to_string()));
        unsafe { std::env::remove_var(API_KEY_ENV) };
    }

    #[test]
    #[serial]
    fn test_resolve_from_config_value() {
        unsafe { std::env::remove_var(API_KEY_ENV) };
        let resolved = resolve_api_key(Some("file-key")).unwrap();
        assert_eq!(resolved.value, "file-key");
        assert_eq!(resolved.source, SecretSource::ConfigFile);
    }

    #[test]
    #[serial]
    fn test_empty_env_var_is_ignored() {
        unsafe { std::env::set_var(API_KEY_ENV, "") };
        assert!(resolve_api_key(None).is_none());
        unsafe { std::env::remove_var(API_KEY_ENV) };
    }

    #[test]
    #[serial]
    fn test_require_missing_key() {
        unsafe { std::env::remove_var(API_KEY_ENV) };
        let err = require_api_key(Some("")).unwrap_err();
        assert!(matches!(err, ConfigError::ApiKeyNotFound { .. }));
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_debug_redacts_value() {
        let secret = ResolvedSecret {
            value: "AIza-very-secret".to_string(),
            source: SecretSource::ConfigFile,
        };
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("very-secret"));
        assert_eq!(secret.source.to_string(), "config file (plaintext)");
    }
}
