//! Variant handlers.
//!
//! A variant names a handler kind (`"default"` when omitted). The
//! [`HandlerRegistry`] maps that kind to a [`HandlerFactory`], which validates
//! the variant's payload and builds the [`VariantHandler`] that produces
//! responses at dispatch time.
//!
//! Built-in kinds:
//! - `default` - static `response` object, or a programmatic responder
//! - `json` - `response.body` always serialized as JSON
//! - `text` - `response.body` served as plain text
//! - `status` - `response.status` with an empty body
//! - `static` - files served from a directory below the route url

mod request;
mod respond;
mod static_files;

pub use request::{MockRequest, MockResponse};
pub use respond::{BodyMode, RespondFactory};
pub use static_files::StaticFactory;

use crate::definitions::{RouteDefinition, ValidationError, VariantDefinition};
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::Full;
use hyper::Response;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// What a handler did with a request.
#[derive(Debug)]
pub enum Outcome {
    /// The request was answered
    Respond(Response<Full<Bytes>>),
    /// Pass-through: let the next matching route handle it
    Next,
}

impl Outcome {
    pub fn is_next(&self) -> bool {
        matches!(self, Outcome::Next)
    }
}

/// Runtime behaviour of one route variant.
#[async_trait]
pub trait VariantHandler: Send + Sync {
    async fn handle(&self, request: &MockRequest) -> Outcome;

    /// Whether the handler is mounted on the route url as a prefix
    /// (e.g. a file server) instead of matching it exactly.
    fn mounts_prefix(&self) -> bool {
        false
    }

    /// Summary of what the variant serves, for admin listings.
    fn preview(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}

/// Errors raised while building a handler from a valid definition.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
    #[error("Directory '{0}' does not exist or is not a directory")]
    MissingDirectory(PathBuf),
}

/// Constructor and payload validator for one handler kind.
pub trait HandlerFactory: Send + Sync {
    /// Kind name referenced by variants
    fn kind(&self) -> &str;

    /// Validate the handler-specific part of a variant.
    fn validate(&self, _variant: &VariantDefinition) -> Vec<ValidationError> {
        Vec::new()
    }

    fn create(
        &self,
        route: &RouteDefinition,
        variant: &VariantDefinition,
    ) -> Result<Arc<dyn VariantHandler>, HandlerError>;
}

/// Handler kinds known to the engine, keyed by kind name.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    factories: BTreeMap<String, Arc<dyn HandlerFactory>>,
}

impl HandlerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in kind.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(RespondFactory::new("default", BodyMode::Auto));
        registry.register(RespondFactory::new("json", BodyMode::Json));
        registry.register(RespondFactory::new("text", BodyMode::Text));
        registry.register(RespondFactory::new("status", BodyMode::Empty));
        registry.register(StaticFactory);
        registry
    }

    /// Register a factory, replacing any previous one with the same kind.
    pub fn register<F: HandlerFactory + 'static>(&mut self, factory: F) {
        let kind = factory.kind().to_string();
        if self.factories.contains_key(&kind) {
            debug!("Replacing variant handler '{}'", kind);
        }
        self.factories.insert(kind, Arc::new(factory));
    }

    pub fn get(&self, kind: &str) -> Option<&Arc<dyn HandlerFactory>> {
        self.factories.get(kind)
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
