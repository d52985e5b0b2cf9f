//! Gateway traits for all outbound calls to the remote API.
//!
//! Implementations make exactly one attempt per call and never touch local
//! collections. Failures are typed:
//! - [`MembercareError::Auth`] when a resource needs a session and there is
//!   none. This is raised before any network attempt.
//! - [`MembercareError::Remote`] for network failures and non-2xx responses.
//!
//! [`MembercareError::Auth`]: crate::error::MembercareError::Auth
//! [`MembercareError::Remote`]: crate::error::MembercareError::Remote

use crate::error::Result;
use crate::record::{Record, RecordId};
use crate::resource::Resource;
use crate::session::Session;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

/// CRUD access to record collections.
#[async_trait]
pub trait RecordGateway: Send + Sync {
    /// Fetches the full collection. The result replaces any local copy.
    async fn list(&self, resource: &Resource) -> Result<Vec<Record>>;

    /// Creates a record and returns it as stored (with its assigned id).
    async fn create(&self, resource: &Resource, record: &Record) -> Result<Record>;

    /// Applies a partial update to the record with `id`.
    async fn update(&self, resource: &Resource, id: &RecordId, patch: &Record) -> Result<Record>;

    /// Deletes the record with `id`.
    async fn remove(&self, resource: &Resource, id: &RecordId) -> Result<()>;

    /// Sends a multipart form (documents, photos) and returns the created record.
    async fn upload(&self, resource: &Resource, form: UploadForm) -> Result<Record>;
}

/// Sign-in against the auth endpoint.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Exchanges credentials for a session. Does not persist anything.
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session>;
}

#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A file attached to an [`UploadForm`].
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    /// Multipart part name, e.g. `document`.
    pub field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Text fields plus at most one file, sent as `multipart/form-data`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadForm {
    pub fields: Vec<(String, String)>,
    pub file: Option<UploadFile>,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text parts are taken from the record in field order; blank values are skipped.
    pub fn from_record(record: &Record) -> Self {
        let fields = record
            .fields()
            .filter(|(_, value)| !value.is_blank())
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        Self { fields, file: None }
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn file(mut self, field: impl Into<String>, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.file = Some(UploadFile {
            field: field.into(),
            file_name: file_name.into(),
            bytes,
        });
        self
    }
}
