//! Route, variant and collection definitions.
//!
//! Definitions are produced by the file loader (or built in code) and handed to
//! [`Mocks::load`](crate::mocks::Mocks::load) as a whole on every reload. They are
//! never mutated afterwards.
//!
//! Every structural field is optional at the type level: the
//! [`validator`] reports missing fields as errors instead of failing
//! deserialization of the whole file.

mod validator;

pub use validator::{
    validate_collection, validate_collections, validate_route, validate_routes, ValidationError,
    ValidationReport,
};

use crate::handlers::{MockRequest, MockResponse};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Handler kind used when a variant does not name one.
pub const DEFAULT_HANDLER: &str = "default";

/// Verbs accepted in a route `method` field (lower-case canonical form).
pub const HTTP_VERBS: [&str; 9] = [
    "get", "post", "put", "patch", "delete", "head", "options", "trace", "connect",
];

/// Wildcard verb matching every method.
pub const ANY_VERB: &str = "*";

/// Separator between route id and variant id in a composite variant id.
pub const VARIANT_ID_SEPARATOR: char = ':';

/// Build the composite `routeId:variantId` key.
pub fn variant_key(route_id: &str, variant_id: &str) -> String {
    format!("{route_id}{VARIANT_ID_SEPARATOR}{variant_id}")
}

/// Split a composite variant id into its route and variant parts.
///
/// The split happens at the first separator; variant ids may contain `:`.
pub fn split_variant_key(key: &str) -> Option<(&str, &str)> {
    key.split_once(VARIANT_ID_SEPARATOR)
        .filter(|(route, variant)| !route.is_empty() && !variant.is_empty())
}

/// Route URL: an Express-style path or an explicit regular expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UrlPattern {
    /// Path with optional `:param` segments and `*` wildcards
    Path(String),
    /// Regular expression matched against the request path
    Regex { regex: String },
}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlPattern::Path(path) => f.write_str(path),
            UrlPattern::Regex { regex } => write!(f, "/{regex}/"),
        }
    }
}

/// One verb or a set of verbs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MethodSpec {
    One(String),
    Many(Vec<String>),
}

impl MethodSpec {
    /// Lower-cased verbs as written, without deduplication.
    pub fn verbs(&self) -> Vec<String> {
        match self {
            MethodSpec::One(verb) => vec![verb.to_lowercase()],
            MethodSpec::Many(verbs) => verbs.iter().map(|v| v.to_lowercase()).collect(),
        }
    }
}

/// Programmatic response producer for function-style variants.
pub type Responder = Arc<dyn Fn(&MockRequest) -> Reply + Send + Sync>;

/// Result of a [`Responder`] call.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Send this response
    Respond(MockResponse),
    /// Pass the request on to the next matching route
    Next,
}

/// A route definition with its variants.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct RouteDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<UrlPattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<MethodSpec>,
    /// Route-level default delay in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<i64>,
    #[serde(default)]
    pub variants: Vec<VariantDefinition>,
}

impl fmt::Debug for RouteDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDefinition")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("method", &self.method)
            .field("delay", &self.delay)
            .field("variants", &self.variants.len())
            .finish()
    }
}

impl RouteDefinition {
    /// Start a route definition in code.
    pub fn new(id: impl Into<String>, method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            url: Some(UrlPattern::Path(url.into())),
            method: Some(MethodSpec::One(method.into())),
            delay: None,
            variants: Vec::new(),
        }
    }

    pub fn with_delay(mut self, delay: i64) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_variant(mut self, variant: VariantDefinition) -> Self {
        self.variants.push(variant);
        self
    }

    /// Methods this route registers for; `None` means every verb.
    pub fn normalized_methods(&self) -> Option<Vec<String>> {
        let verbs = self.method.as_ref()?.verbs();
        if verbs.iter().any(|v| v == ANY_VERB) {
            return None;
        }
        let mut unique: Vec<String> = Vec::with_capacity(verbs.len());
        for verb in verbs {
            if !unique.contains(&verb) {
                unique.push(verb);
            }
        }
        Some(unique)
    }
}

/// One possible behaviour of a route.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct VariantDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Handler kind; `"default"` when absent
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    /// `None` inherits the route delay, then the global delay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<i64>,
    /// Handler-specific fields (`response`, `path`, ...)
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
    #[serde(skip)]
    pub responder: Option<Responder>,
}

impl fmt::Debug for VariantDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantDefinition")
            .field("id", &self.id)
            .field("handler", &self.handler)
            .field("delay", &self.delay)
            .field("payload", &self.payload)
            .field("responder", &self.responder.is_some())
            .finish()
    }
}

impl VariantDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    /// Static response served by the `default` handler.
    pub fn with_response(mut self, status: u16, body: serde_json::Value) -> Self {
        self.payload.insert(
            "response".to_string(),
            serde_json::json!({ "status": status, "body": body }),
        );
        self
    }

    /// Function-style response served by the `default` handler.
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&MockRequest) -> Reply + Send + Sync + 'static,
    {
        self.responder = Some(Arc::new(responder));
        self
    }

    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    pub fn with_delay(mut self, delay: Option<i64>) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_payload(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    pub fn handler_kind(&self) -> &str {
        self.handler.as_deref().unwrap_or(DEFAULT_HANDLER)
    }
}

/// A named selection of one variant per route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, alias = "routes", skip_serializing_if = "Option::is_none")]
    pub routes_variants: Option<Vec<String>>,
}

impl CollectionDefinition {
    pub fn new<I, S>(id: impl Into<String>, routes_variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: Some(id.into()),
            from: None,
            routes_variants: Some(routes_variants.into_iter().map(Into::into).collect()),
        }
    }

    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }
}
