//! Unified path management for Membercare files.
//!
//! ```text
//! ~/.config/membercare/        # Config directory
//! ├── config.toml              # Client configuration
//! └── session.json             # Persisted { token, user }
//!
//! ~/.local/share/membercare/   # Data directory
//! └── logs/                    # Rolling log files
//!     └── membercare.log.YYYY-MM-DD
//! ```

use std::path::{Path, PathBuf};

const APP_DIR: &str = "membercare";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Resolves Membercare paths, optionally under a custom base directory (tests).
#[derive(Debug, Clone, Default)]
pub struct MembercarePaths {
    base: Option<PathBuf>,
}

impl MembercarePaths {
    /// `None` uses the platform directories; `Some(dir)` roots everything at `dir`.
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// Returns the configuration directory (e.g. `~/.config/membercare/`).
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    /// Returns the data directory (e.g. `~/.local/share/membercare/`).
    pub fn data_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.join("data")),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::HomeDirNotFound),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    /// Path of the persisted session.
    ///
    /// # Security Note
    ///
    /// The file holds a bearer token; it is written with mode 600 on Unix.
    pub fn session_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("session.json"))
    }

    pub fn log_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.data_dir()?.join("logs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_base() {
        let paths = MembercarePaths::new(Some(Path::new("/tmp/mc-test")));
        assert_eq!(paths.config_file().unwrap(), PathBuf::from("/tmp/mc-test/config.toml"));
        assert_eq!(paths.session_file().unwrap(), PathBuf::from("/tmp/mc-test/session.json"));
        assert_eq!(paths.log_dir().unwrap(), PathBuf::from("/tmp/mc-test/data/logs"));
    }
}
