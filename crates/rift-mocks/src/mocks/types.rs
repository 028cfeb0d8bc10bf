//! Error and listener types for the mocks engine.

use serde::Serialize;
use std::sync::Arc;

/// Errors returned by the mutating operations of [`Mocks`](super::Mocks).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MocksError {
    #[error("Collection '{0}' was not found")]
    CollectionNotFound(String),
    #[error("Route variant '{0}' was not found")]
    VariantNotFound(String),
}

/// Callback fired after a new router has been published.
pub type ChangeListener = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by [`Mocks::on_change`](super::Mocks::on_change).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// Serializable summary of a collection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlainCollection {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    pub routes_variants: Vec<String>,
}
