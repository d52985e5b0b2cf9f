//! Application layer of the Membercare client.
//!
//! Screen controllers, the sign-in flow, the screen catalog, and the
//! composition root that wires them to the infrastructure layer.

pub mod auth_service;
pub mod bootstrap;
pub mod controller;
pub mod screens;

pub use auth_service::AuthService;
pub use bootstrap::ClientApp;
pub use controller::ScreenController;
pub use screens::ScreenProfile;
