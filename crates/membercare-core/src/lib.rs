//! Domain layer of the Membercare client.
//!
//! Holds everything a screen needs that does not touch the network or the
//! file system: records, form validation, list filtering, the screen state
//! machine, the session context, and the gateway traits implemented by
//! `membercare-infrastructure`.

pub mod config;
pub mod envelope;
pub mod error;
pub mod filter;
pub mod form;
pub mod gateway;
pub mod notice;
pub mod record;
pub mod resource;
pub mod screen;
pub mod session;

// Re-export common types
pub use error::{MembercareError, Result};
pub use filter::{Category, ListFilter, ListSnapshot};
pub use form::{FormSchema, FormState, Rule, ValidationErrors};
pub use gateway::{AuthGateway, Credentials, RecordGateway, UploadForm};
pub use notice::{Notice, NoticeKind};
pub use record::{FieldValue, Record, RecordId};
pub use resource::Resource;
pub use screen::{ScreenEvent, ScreenState};
pub use session::{Session, SessionContext, SessionStore, SessionUser};
