//! File-backed session storage.
//!
//! The whole session lives in one JSON document (`session.json`). Writes go
//! through a temporary file and an atomic rename so a crash never leaves a
//! half-written token behind.

use crate::paths::MembercarePaths;
use async_trait::async_trait;
use membercare_core::error::{MembercareError, Result};
use membercare_core::session::{Session, SessionStore};
use std::path::{Path, PathBuf};

/// [`SessionStore`] persisting to a single JSON file.
///
/// Responsibilities:
/// - Read and parse `session.json` (missing or empty file means signed out)
/// - Atomic replace on save, owner-only permissions on Unix
/// - Delete on clear
///
/// Does NOT:
/// - Decide what a malformed file means (see `SessionContext::get_session`)
/// - Detect token expiry
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at the default location (`<config dir>/session.json`).
    pub fn default_location() -> Result<Self> {
        let path = MembercarePaths::new(None)
            .session_file()
            .map_err(|e| MembercareError::config(e.to_string()))?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "session.json".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<Session>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        let session: Session = serde_json::from_str(&content)?;
        Ok(Some(session))
    }

    async fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(session)?;
        let tmp_path = self.temp_path();
        tokio::fs::write(&tmp_path, json.as_bytes()).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600)).await?;
        }

        if let Err(e) = tokio::fs::rename(&tmp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        tracing::debug!("[SessionStore] Session written to {:?}", self.path);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
