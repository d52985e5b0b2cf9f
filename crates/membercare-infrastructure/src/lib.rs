//! Infrastructure layer: HTTP gateway, file-backed storage, configuration, logging.

pub mod config_service;
pub mod http_gateway;
pub mod paths;
pub mod session_storage;
pub mod telemetry;

pub use crate::config_service::ConfigService;
pub use crate::http_gateway::HttpGateway;
pub use crate::paths::MembercarePaths;
pub use crate::session_storage::FileSessionStore;
