//! Mock routing engine.
//!
//! This module provides:
//! - `Mocks`: the live router holder (load, collection selection, overrides)
//! - `CompiledRouter`: the dispatchable router for one resolved collection
//! - `resolve`: collection inheritance and override resolution
//!
//! ## Module Structure
//!
//! - `url`: Express-style url patterns compiled to regexes
//! - `index`: id-indexed snapshot of the valid definitions of one load
//! - `overrides`: runtime route variant overrides
//! - `resolver`: collection resolution
//! - `router`: router compilation and dispatch
//! - `core`: the `Mocks` holder
//! - `types`: errors and listener handles

mod core;
mod index;
mod overrides;
mod resolver;
mod router;
mod types;
mod url;

#[cfg(test)]
mod tests;

pub use self::core::Mocks;
pub use index::{DefinitionIndex, IndexError, PlainRoute, PlainVariant, RouteVariant};
pub use overrides::OverrideSet;
pub use resolver::{resolve, Resolution, ResolveError};
pub use router::{fixed_delay, CompiledRouter, DelayProvider, DuplicateEntry};
pub use types::{ChangeListener, ListenerId, MocksError, PlainCollection};
pub use url::{UrlMatch, UrlMatcher};
