//! User-visible notices produced at the screen boundary.

use crate::error::MembercareError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Info,
    Error,
    /// The user has to sign in again before continuing.
    SignIn,
}

/// A dismissable message. Rendering is up to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    /// Converts a failure into what the user sees.
    ///
    /// Cancellation is silent: the screen that asked is gone.
    pub fn from_error(error: &MembercareError) -> Option<Self> {
        match error {
            MembercareError::Cancelled => None,
            MembercareError::Auth(_) => Some(Self {
                kind: NoticeKind::SignIn,
                message: error.user_message(),
            }),
            _ => Some(Self::error(error.user_message())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_becomes_sign_in_notice() {
        let notice = Notice::from_error(&MembercareError::auth("missing")).unwrap();
        assert_eq!(notice.kind, NoticeKind::SignIn);
    }

    #[test]
    fn test_cancelled_is_silent() {
        assert!(Notice::from_error(&MembercareError::Cancelled).is_none());
    }

    #[test]
    fn test_remote_keeps_server_message() {
        let notice = Notice::from_error(&MembercareError::remote(409, "Member already added")).unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.message, "Member already added");
    }
}
