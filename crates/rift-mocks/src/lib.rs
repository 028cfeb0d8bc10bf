// Library exports for the binary and the integration tests

// ===== Mock engine =====
pub mod alerts;
pub mod definitions;
pub mod handlers;
pub mod mocks;
pub mod response;

// ===== Runtime surfaces =====
pub mod admin_api;
pub mod config;
pub mod files;
pub mod server;

pub use alerts::{AlertSink, Alerts};
pub use mocks::Mocks;
