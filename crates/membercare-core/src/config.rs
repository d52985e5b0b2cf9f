//! Client configuration model.
//!
//! Loaded from `config.toml` by the infrastructure layer. Every section and
//! field has a default, so an empty or missing file yields a working config.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "https://api.membercare.health/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL all resource paths are joined onto.
    pub base_url: String,
    /// Fixed per-request timeout. There is no retry.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("membercare-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Overrides the session file location (default: `<config dir>/session.json`).
    pub session_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `info` or `membercare_infrastructure=debug`.
    pub level: String,
    /// When set, logs are also written to a daily-rolling file here.
    /// `ClientApp::bootstrap` fills in the data directory's `logs/` when unset.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.api.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_partial_section() {
        let config: ClientConfig = toml::from_str(
            r#"
            [api]
            base_url = "https://staging.example.test/api"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://staging.example.test/api");
        assert_eq!(config.api.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.logging.level, "debug");
        assert!(config.storage.session_file.is_none());
    }
}
