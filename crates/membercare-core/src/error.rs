//! Error types for the Membercare client core.

use crate::form::ValidationErrors;
use serde::Serialize;
use thiserror::Error;

/// Notice shown when a remote failure carries no usable message.
pub const GENERIC_REMOTE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Notice shown when the server could not be reached at all.
pub const NETWORK_REMOTE_MESSAGE: &str =
    "Unable to reach the server. Check your connection and try again.";

/// A shared error type for the whole client.
///
/// Every failure a screen can observe is one of these variants. None of them
/// is fatal: the screen boundary turns each into a [`crate::notice::Notice`]
/// and returns to an interactive state.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum MembercareError {
    /// Missing or unusable session. The user must sign in again.
    #[error("Authentication required: {0}")]
    Auth(String),

    /// Local field-level validation failed.
    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(ValidationErrors),

    /// Network failure (`status` is `None`) or a non-2xx response.
    #[error("Remote error ({}): {message}", status_label(.status))]
    Remote { status: Option<u16>, message: String },

    /// A mutating call is already outstanding for this screen.
    #[error("A submission is already in progress")]
    SubmitInFlight,

    /// The screen was torn down before the response arrived.
    #[error("Operation cancelled: screen is no longer active")]
    Cancelled,

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "network".to_string(),
    }
}

impl MembercareError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an Auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Creates a Remote error for a completed HTTP exchange
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Creates a Remote error for a request that never got a response
    pub fn network(message: impl Into<String>) -> Self {
        Self::Remote {
            status: None,
            message: message.into(),
        }
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Serialization error
    pub fn serialization(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Serialization {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// HTTP status of a remote failure, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => *status,
            _ => None,
        }
    }

    /// Text suitable for a dismissable notice in the UI.
    ///
    /// Never contains tokens or raw transport details.
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth(_) => "Your session has ended. Please sign in again.".to_string(),
            Self::Validation(errors) => match errors.len() {
                1 => "Please correct the highlighted field.".to_string(),
                n => format!("Please correct the {} highlighted fields.", n),
            },
            Self::Remote { message, .. } if !message.trim().is_empty() => message.clone(),
            Self::Remote { .. } => GENERIC_REMOTE_MESSAGE.to_string(),
            Self::SubmitInFlight => "Your request is already being sent.".to_string(),
            Self::Cancelled => String::new(),
            Self::NotFound { entity_type, .. } => format!("The requested {} was not found.", entity_type),
            Self::Io { .. } | Self::Serialization { .. } | Self::Config(_) | Self::Internal(_) => {
                GENERIC_REMOTE_MESSAGE.to_string()
            }
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for MembercareError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for MembercareError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for MembercareError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<ValidationErrors> for MembercareError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

/// Conversion from anyhow::Error (composition code only)
impl From<anyhow::Error> for MembercareError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, MembercareError>`.
pub type Result<T> = std::result::Result<T, MembercareError>;
