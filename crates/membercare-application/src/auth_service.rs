//! Sign-in and sign-out.
//!
//! `AuthService` is the only writer of the persisted session. Screens read it
//! through a [`SessionContext`] built on the same store.

use membercare_core::error::{MembercareError, Result};
use membercare_core::form::{FormSchema, Rule};
use membercare_core::gateway::{AuthGateway, Credentials};
use membercare_core::record::Record;
use membercare_core::session::{Session, SessionContext, SessionStore, SessionUser};
use std::sync::Arc;

pub struct AuthService {
    gateway: Arc<dyn AuthGateway>,
    store: Arc<dyn SessionStore>,
    schema: FormSchema,
}

impl AuthService {
    pub fn new(gateway: Arc<dyn AuthGateway>, store: Arc<dyn SessionStore>) -> Self {
        let schema = FormSchema::new()
            .field("email", [Rule::Required, Rule::Email])
            .field("password", [Rule::Required]);
        Self {
            gateway,
            store,
            schema,
        }
    }

    /// Validates the credentials, signs in, and persists the session.
    ///
    /// Nothing is written unless the server returned a usable session.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Session> {
        let form = Record::new()
            .with("email", credentials.email.as_str())
            .with("password", credentials.password.as_str());
        let errors = self.schema.validate(&form);
        if !errors.is_empty() {
            return Err(MembercareError::Validation(errors));
        }

        let session = self.gateway.sign_in(credentials).await?;
        self.store.save(&session).await?;
        tracing::info!("[AuthService] Signed in user {}", session.user.id);
        Ok(session)
    }

    /// Clears the persisted session. Signing out twice is fine.
    pub async fn sign_out(&self) -> Result<()> {
        self.store.clear().await?;
        tracing::info!("[AuthService] Signed out");
        Ok(())
    }

    /// The signed-in user, if any.
    pub async fn current_user(&self) -> Option<SessionUser> {
        self.context().get_session().await.map(|session| session.user)
    }

    /// Read-only session handle for screens and gateways.
    pub fn context(&self) -> SessionContext {
        SessionContext::new(self.store.clone())
    }
}
