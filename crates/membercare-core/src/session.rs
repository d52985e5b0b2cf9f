//! Session domain module.
//!
//! The [`Session`] is the locally persisted proof of authentication. Screens
//! never read storage directly: they receive a [`SessionContext`], which owns
//! the "no token means the action is blocked" policy.

use crate::error::{MembercareError, Result};
use crate::record::RecordId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Signed-in user. `id` is required; every other profile attribute is kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: RecordId,
    #[serde(flatten)]
    pub profile: serde_json::Map<String, serde_json::Value>,
}

impl SessionUser {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            profile: serde_json::Map::new(),
        }
    }

    /// Profile attribute as text, e.g. `name` or `email`.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.profile.get(key).and_then(|value| value.as_str())
    }
}

/// `{ token, user }` exactly as persisted under the session storage key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: SessionUser,
}

impl Session {
    pub fn new(token: impl Into<String>, user: SessionUser) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }

    /// A session with a blank token cannot authorize anything.
    pub fn is_usable(&self) -> bool {
        !self.token.trim().is_empty()
    }
}

/// Persistence for the single session document.
///
/// Only the sign-in and sign-out flow writes through this trait; screens only read.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads the persisted session.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Session))`: A session is stored
    /// - `Ok(None)`: Nothing is stored
    /// - `Err(_)`: Storage is unreadable or the document is malformed
    async fn load(&self) -> Result<Option<Session>>;

    /// Persists the session, replacing any previous one.
    async fn save(&self, session: &Session) -> Result<()>;

    /// Removes the stored session. Clearing an empty store succeeds.
    async fn clear(&self) -> Result<()>;
}

/// Explicit session handle passed to everything that talks to the API.
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Reads the current session. Never fails: absent, malformed, or
    /// token-less sessions all read as `None`.
    pub async fn get_session(&self) -> Option<Session> {
        match self.store.load().await {
            Ok(Some(session)) if session.is_usable() => Some(session),
            Ok(Some(_)) => {
                tracing::warn!("[Session] Stored session has an empty token; treating as signed out");
                None
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("[Session] Ignoring unreadable session: {}", e);
                None
            }
        }
    }

    /// Returns the bearer token or fails with an auth error.
    pub async fn require_token(&self) -> Result<String> {
        self.get_session()
            .await
            .map(|session| session.token)
            .ok_or_else(|| MembercareError::auth("no active session"))
    }

    /// Token if signed in, without failing.
    pub async fn token(&self) -> Option<String> {
        self.get_session().await.map(|session| session.token)
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }
}

/// Session store kept in memory. Used by tests and by embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<Session>> {
        let guard = self
            .session
            .lock()
            .map_err(|e| MembercareError::internal(format!("session lock poisoned: {}", e)))?;
        Ok(guard.clone())
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let mut guard = self
            .session
            .lock()
            .map_err(|e| MembercareError::internal(format!("session lock poisoned: {}", e)))?;
        *guard = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut guard = self
            .session
            .lock()
            .map_err(|e| MembercareError::internal(format!("session lock poisoned: {}", e)))?;
        *guard = None;
        Ok(())
    }
}
