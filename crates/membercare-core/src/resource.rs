//! Remote resource descriptors.

use crate::envelope::EnvelopeShape;
use serde::{Deserialize, Serialize};

/// One REST collection on the API, e.g. `members/family`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Short name used in logs and notices.
    pub name: String,
    /// Path relative to the API base URL, without leading or trailing slash.
    pub path: String,
    /// How list and single-record responses are wrapped.
    #[serde(default)]
    pub envelope: EnvelopeShape,
    /// Whether calls must carry a bearer token.
    #[serde(default = "default_requires_auth")]
    pub requires_auth: bool,
}

fn default_requires_auth() -> bool {
    true
}

impl Resource {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into().trim_matches('/').to_string(),
            envelope: EnvelopeShape::default(),
            requires_auth: true,
        }
    }

    pub fn with_envelope(mut self, envelope: EnvelopeShape) -> Self {
        self.envelope = envelope;
        self
    }

    /// Marks the resource as readable without signing in (public catalogs).
    pub fn public(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    /// Path of a single item, `{path}/{id}`.
    pub fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.path, id)
    }
}
