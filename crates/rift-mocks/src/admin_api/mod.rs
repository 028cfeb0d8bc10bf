//! Admin REST API for Rift Mocks.
//!
//! This module provides a REST API for:
//! - Listing routes, route variants and collections
//! - Selecting the current collection
//! - Forcing and restoring custom route variants
//! - Alerts, global delay and reloading the mocks folder
//!
//! The API listens on a configurable port (default: 3110).

mod handlers;
mod router;
mod server;
mod types;

pub use router::route_by_path;
pub use server::{serve, AdminApiServer};
pub use types::AdminState;
