//! Configuration service implementation.
//!
//! Loads [`ClientConfig`] from `config.toml` and applies environment overrides:
//! - `MEMBERCARE_API_BASE_URL` replaces `api.base_url`
//! - `MEMBERCARE_LOG_LEVEL` replaces `logging.level`

use crate::paths::MembercarePaths;
use membercare_core::config::ClientConfig;
use membercare_core::error::{MembercareError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

pub const ENV_BASE_URL: &str = "MEMBERCARE_API_BASE_URL";
pub const ENV_LOG_LEVEL: &str = "MEMBERCARE_LOG_LEVEL";

/// Configuration service that loads and caches the client configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<ClientConfig>>>,
}

impl ConfigService {
    /// Service reading the given file. Nothing is read until first access.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Service reading `<config dir>/config.toml`.
    pub fn default_location() -> Result<Self> {
        let path = MembercarePaths::new(None)
            .config_file()
            .map_err(|e| MembercareError::config(e.to_string()))?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the configuration, loading from file if not cached.
    pub fn get_config(&self) -> Result<ClientConfig> {
        {
            let read_lock = self
                .config
                .read()
                .map_err(|e| MembercareError::internal(format!("config cache poisoned: {}", e)))?;
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let mut loaded = Self::load_file(&self.path)?;
        Self::apply_overrides(&mut loaded, |key| std::env::var(key).ok());

        {
            let mut write_lock = self
                .config
                .write()
                .map_err(|e| MembercareError::internal(format!("config cache poisoned: {}", e)))?;
            *write_lock = Some(loaded.clone());
        }

        tracing::debug!("[ConfigService] Loaded config from {:?}", self.path);
        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        if let Ok(mut write_lock) = self.config.write() {
            *write_lock = None;
        }
    }

    /// Reads and parses a config file. A missing or empty file yields defaults.
    pub fn load_file(path: &Path) -> Result<ClientConfig> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("[ConfigService] No config at {:?}, using defaults", path);
                return Ok(ClientConfig::default());
            }
            Err(e) => return Err(e.into()),
        };

        toml::from_str(&content)
            .map_err(|e| MembercareError::config(format!("{}: {}", path.display(), e)))
    }

    /// Applies environment overrides through `lookup` (injectable for tests).
    pub fn apply_overrides<F>(config: &mut ClientConfig, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            config.api.base_url = base_url;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
            config.logging.level = level;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use membercare_core::config::DEFAULT_BASE_URL;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigService::load_file(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api\nbase_url = ").unwrap();
        let err = ConfigService::load_file(&path).unwrap_err();
        assert!(matches!(err, MembercareError::Config(_)));
    }

    #[test]
    fn test_file_values_are_read_and_cached() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api]\ntimeout_secs = 12\n").unwrap();

        let service = ConfigService::new(path.clone());
        assert_eq!(service.get_config().unwrap().api.timeout_secs, 12);

        std::fs::write(&path, "[api]\ntimeout_secs = 99\n").unwrap();
        assert_eq!(service.get_config().unwrap().api.timeout_secs, 12);

        service.invalidate_cache();
        assert_eq!(service.get_config().unwrap().api.timeout_secs, 99);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ClientConfig::default();
        ConfigService::apply_overrides(&mut config, |key| match key {
            ENV_BASE_URL => Some("http://127.0.0.1:9000".to_string()),
            ENV_LOG_LEVEL => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.api.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.logging.level, "info");
    }
}
