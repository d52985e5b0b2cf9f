//! Composition root.
//!
//! Wires configuration, the file-backed session store, the HTTP gateway, and
//! the auth service, and hands out one [`ScreenController`] per opened screen.

use crate::auth_service::AuthService;
use crate::controller::ScreenController;
use crate::screens::ScreenProfile;
use anyhow::{Result, anyhow};
use membercare_core::config::ClientConfig;
use membercare_core::session::{SessionContext, SessionStore};
use membercare_infrastructure::{ConfigService, FileSessionStore, HttpGateway, MembercarePaths};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct ClientApp {
    config: ClientConfig,
    session: SessionContext,
    gateway: Arc<HttpGateway>,
    auth: AuthService,
}

impl ClientApp {
    /// Loads `config.toml` and builds the app.
    ///
    /// `base` roots config, session, and log files in one directory; `None`
    /// uses the platform directories. Without a configured log directory,
    /// `logging.directory` defaults to the data directory's `logs/`.
    pub fn bootstrap(base: Option<&Path>) -> Result<Self> {
        let paths = MembercarePaths::new(base);
        let config_file = paths
            .config_file()
            .map_err(|e| anyhow!("Failed to resolve config path: {}", e))?;
        let mut config = ConfigService::new(config_file).get_config()?;
        if config.logging.directory.is_none() {
            let log_dir = paths
                .log_dir()
                .map_err(|e| anyhow!("Failed to resolve log directory: {}", e))?;
            config.logging.directory = Some(log_dir);
        }

        let session_file = match &config.storage.session_file {
            Some(path) => path.clone(),
            None => paths
                .session_file()
                .map_err(|e| anyhow!("Failed to resolve session path: {}", e))?,
        };

        Self::from_config(config, session_file)
    }

    /// Builds the app from an already loaded configuration.
    pub fn from_config(config: ClientConfig, session_file: PathBuf) -> Result<Self> {
        tracing::info!("[Bootstrap] Session file: {:?}", session_file);
        let store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(session_file));
        let session = SessionContext::new(store.clone());

        let gateway = Arc::new(HttpGateway::new(&config.api, session.clone())?);
        tracing::info!("[Bootstrap] API base URL: {}", gateway.base_url());

        let auth = AuthService::new(gateway.clone(), store);

        Ok(Self {
            config,
            session,
            gateway,
            auth,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    /// Read-only session handle.
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Opens a screen. Call [`ScreenController::teardown`] (or drop it) when
    /// the screen goes away.
    pub fn screen(&self, profile: ScreenProfile) -> ScreenController {
        ScreenController::new(self.gateway.clone(), profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use membercare_core::session::{Session, SessionUser};
    use membercare_core::screen::ScreenState;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_bootstrap_with_defaults() {
        let dir = TempDir::new().unwrap();
        let app = ClientApp::bootstrap(Some(dir.path())).unwrap();

        assert_eq!(app.config().api.timeout_secs, 30);
        assert!(app.session().get_session().await.is_none());
        assert!(app.auth().current_user().await.is_none());

        let screen = app.screen(ScreenProfile::contact_form());
        assert_eq!(screen.state().await, ScreenState::Idle);
    }

    #[tokio::test]
    async fn test_bootstrap_defaults_log_directory() {
        let dir = TempDir::new().unwrap();
        let app = ClientApp::bootstrap(Some(dir.path())).unwrap();
        assert_eq!(
            app.config().logging.directory,
            Some(dir.path().join("data").join("logs"))
        );

        let custom = dir.path().join("custom-logs");
        std::fs::write(
            dir.path().join("config.toml"),
            format!("[logging]\ndirectory = {:?}\n", custom.display().to_string()),
        )
        .unwrap();
        let app = ClientApp::bootstrap(Some(dir.path())).unwrap();
        assert_eq!(app.config().logging.directory, Some(custom));
    }

    #[tokio::test]
    async fn test_bootstrap_reads_config_and_session_file() {
        let dir = TempDir::new().unwrap();
        let session_file = dir.path().join("custom-session.json");
        std::fs::write(
            dir.path().join("config.toml"),
            format!(
                "[api]\ntimeout_secs = 7\n\n[storage]\nsession_file = {:?}\n",
                session_file.display().to_string()
            ),
        )
        .unwrap();

        let store = FileSessionStore::new(session_file);
        store
            .save(&Session::new("tok-file", SessionUser::new("12")))
            .await
            .unwrap();

        let app = ClientApp::bootstrap(Some(dir.path())).unwrap();
        assert_eq!(app.config().api.timeout_secs, 7);
        assert_eq!(app.session().require_token().await.unwrap(), "tok-file");
    }

    #[tokio::test]
    async fn test_signed_out_screen_fails_before_network() {
        let dir = TempDir::new().unwrap();
        let mut config = ClientConfig::default();
        // Nothing listens here; an attempted request would be a network error.
        config.api.base_url = "http://127.0.0.1:1".to_string();
        let app = ClientApp::from_config(config, dir.path().join("session.json")).unwrap();

        let screen = app.screen(ScreenProfile::family_members());
        let err = screen.refresh().await.unwrap_err();
        assert!(err.is_auth());
    }
}
