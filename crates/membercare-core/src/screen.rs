//! Per-screen lifecycle state.
//!
//! ```text
//! Idle        --Refresh-->         Loading
//! Loading     --LoadSucceeded-->   Loaded
//! Loading     --LoadFailed-->      LoadError
//! Loaded      --Edit-->            Editing
//! Editing     --Submit-->          Submitting
//! Submitting  --SubmitSucceeded--> Loaded
//! Submitting  --SubmitFailed-->    SubmitError
//! SubmitError --Edit-->            Editing
//! ```
//!
//! Form-only screens never load, so `Edit` is also accepted from `Idle`. A
//! failed load does not lock the form either: `LoadError` accepts `Edit`.
//!
//! There is no terminal state: every state that is not waiting on the network
//! accepts `Refresh`.

use crate::error::{MembercareError, Result};
use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(tag = "state", content = "message")]
pub enum ScreenState {
    #[default]
    Idle,
    Loading,
    Loaded,
    LoadError(String),
    Editing,
    Submitting,
    SubmitError(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ScreenEvent {
    Refresh,
    LoadSucceeded,
    LoadFailed(String),
    Edit,
    Submit,
    SubmitSucceeded,
    SubmitFailed(String),
}

impl ScreenState {
    /// Applies an event, returning the next state or an error for an illegal move.
    pub fn transition(&self, event: ScreenEvent) -> Result<ScreenState> {
        use ScreenEvent as E;
        use ScreenState as S;

        let next = match (self, event) {
            (state, E::Refresh) if !state.is_busy() => S::Loading,
            (S::Loading, E::LoadSucceeded) => S::Loaded,
            (S::Loading, E::LoadFailed(message)) => S::LoadError(message),
            (S::Idle | S::Loaded | S::LoadError(_) | S::Editing | S::SubmitError(_), E::Edit) => {
                S::Editing
            }
            (S::Editing, E::Submit) => S::Submitting,
            (S::Submitting, E::SubmitSucceeded) => S::Loaded,
            (S::Submitting, E::SubmitFailed(message)) => S::SubmitError(message),
            (state, event) => {
                return Err(MembercareError::internal(format!(
                    "invalid screen transition: {} on {}",
                    event, state
                )));
            }
        };
        Ok(next)
    }

    /// True while a network call owned by the screen is outstanding.
    pub fn is_busy(&self) -> bool {
        matches!(self, ScreenState::Loading | ScreenState::Submitting)
    }

    /// Message of a failed load or submit, if any.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            ScreenState::LoadError(message) | ScreenState::SubmitError(message) => Some(message),
            _ => None,
        }
    }
}
