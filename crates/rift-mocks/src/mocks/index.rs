//! Flattened, id-indexed snapshot of one load.
//!
//! Routes are exploded into [`RouteVariant`]s with their url compiled and their
//! handler built, so resolution and compilation only deal with ids and shared
//! pointers into this snapshot.

use super::url::{UrlMatch, UrlMatcher};
use crate::definitions::{variant_key, CollectionDefinition, RouteDefinition, UrlPattern};
use crate::handlers::{HandlerError, HandlerRegistry, VariantHandler};
use hyper::Method;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Problems found while indexing already validated definitions.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Route '{route}' has an invalid url: {source}")]
    Url {
        route: String,
        #[source]
        source: regex::Error,
    },
    #[error("Variant '{variant}' could not be created: {source}")]
    Handler {
        variant: String,
        #[source]
        source: HandlerError,
    },
}

impl IndexError {
    /// Id of the definition the error belongs to.
    pub fn subject(&self) -> &str {
        match self {
            IndexError::Url { route, .. } => route,
            IndexError::Handler { variant, .. } => variant,
        }
    }
}

/// One variant of one route, ready to be dispatched.
pub struct RouteVariant {
    /// Composite `routeId:variantId`
    pub id: String,
    pub route_id: String,
    pub variant_id: String,
    pub url: UrlPattern,
    /// `None` registers for every method
    pub methods: Option<Vec<Method>>,
    pub delay: Option<i64>,
    pub route_delay: Option<i64>,
    pub handler_kind: String,
    matcher: UrlMatcher,
    handler: Arc<dyn VariantHandler>,
}

impl fmt::Debug for RouteVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteVariant")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("methods", &self.methods)
            .field("delay", &self.delay)
            .field("route_delay", &self.route_delay)
            .field("handler_kind", &self.handler_kind)
            .finish()
    }
}

impl RouteVariant {
    /// Variant delay, else route delay, else the current global delay.
    pub fn effective_delay(&self, global: impl FnOnce() -> i64) -> i64 {
        self.delay.or(self.route_delay).unwrap_or_else(global)
    }

    pub fn matches_path(&self, path: &str) -> Option<UrlMatch> {
        self.matcher.matches(path)
    }

    pub fn accepts_method(&self, method: &Method) -> bool {
        match &self.methods {
            None => true,
            Some(methods) => methods.contains(method),
        }
    }

    pub fn handler(&self) -> &Arc<dyn VariantHandler> {
        &self.handler
    }

    pub fn to_plain(&self) -> PlainVariant {
        PlainVariant {
            id: self.id.clone(),
            route: self.route_id.clone(),
            handler: self.handler_kind.clone(),
            delay: self.delay,
            preview: self.handler.preview(),
        }
    }
}

/// Serializable summary of a route variant.
#[derive(Debug, Clone, Serialize)]
pub struct PlainVariant {
    pub id: String,
    pub route: String,
    pub handler: String,
    pub delay: Option<i64>,
    pub preview: serde_json::Value,
}

/// Serializable summary of a route.
#[derive(Debug, Clone, Serialize)]
pub struct PlainRoute {
    pub id: String,
    pub url: String,
    pub method: Vec<String>,
    pub delay: Option<i64>,
    pub variants: Vec<String>,
}

/// Id-indexed view of the valid definitions of one load.
#[derive(Debug, Default)]
pub struct DefinitionIndex {
    routes: Vec<PlainRoute>,
    variants: Vec<Arc<RouteVariant>>,
    variants_by_id: HashMap<String, usize>,
    collections: Vec<CollectionDefinition>,
    collections_by_id: HashMap<String, usize>,
}

impl DefinitionIndex {
    /// Index validated definitions. Variants whose handler or url cannot be
    /// built are left out and reported.
    pub fn build(
        routes: &[RouteDefinition],
        collections: Vec<CollectionDefinition>,
        registry: &HandlerRegistry,
    ) -> (Self, Vec<IndexError>) {
        let mut index = Self::default();
        let mut errors = Vec::new();

        for route in routes {
            let (Some(route_id), Some(url)) = (route.id.as_deref(), route.url.as_ref()) else {
                continue;
            };
            let methods = route.normalized_methods().map(|verbs| {
                verbs
                    .iter()
                    .filter_map(|v| Method::from_bytes(v.to_uppercase().as_bytes()).ok())
                    .collect::<Vec<_>>()
            });

            let mut plain = PlainRoute {
                id: route_id.to_string(),
                url: url.to_string(),
                method: methods
                    .as_ref()
                    .map(|m| m.iter().map(|m| m.as_str().to_lowercase()).collect())
                    .unwrap_or_else(|| vec![crate::definitions::ANY_VERB.to_string()]),
                delay: route.delay,
                variants: Vec::new(),
            };

            for variant in &route.variants {
                let Some(variant_id) = variant.id.as_deref() else {
                    continue;
                };
                let id = variant_key(route_id, variant_id);
                let Some(factory) = registry.get(variant.handler_kind()) else {
                    continue;
                };
                let handler = match factory.create(route, variant) {
                    Ok(handler) => handler,
                    Err(source) => {
                        errors.push(IndexError::Handler {
                            variant: id,
                            source,
                        });
                        continue;
                    }
                };
                let matcher = match UrlMatcher::compile(url, handler.mounts_prefix()) {
                    Ok(matcher) => matcher,
                    Err(source) => {
                        errors.push(IndexError::Url {
                            route: route_id.to_string(),
                            source,
                        });
                        break;
                    }
                };

                plain.variants.push(id.clone());
                index.variants_by_id.insert(id.clone(), index.variants.len());
                index.variants.push(Arc::new(RouteVariant {
                    id,
                    route_id: route_id.to_string(),
                    variant_id: variant_id.to_string(),
                    url: url.clone(),
                    methods: methods.clone(),
                    delay: variant.delay,
                    route_delay: route.delay,
                    handler_kind: variant.handler_kind().to_string(),
                    matcher,
                    handler,
                }));
            }

            index.routes.push(plain);
        }

        for collection in collections {
            if let Some(id) = collection.id.clone() {
                index.collections_by_id.insert(id, index.collections.len());
                index.collections.push(collection);
            }
        }

        (index, errors)
    }

    pub fn variant(&self, id: &str) -> Option<&Arc<RouteVariant>> {
        self.variants_by_id.get(id).map(|&idx| &self.variants[idx])
    }

    pub fn variants(&self) -> &[Arc<RouteVariant>] {
        &self.variants
    }

    pub fn routes(&self) -> &[PlainRoute] {
        &self.routes
    }

    pub fn collection(&self, id: &str) -> Option<&CollectionDefinition> {
        self.collections_by_id
            .get(id)
            .map(|&idx| &self.collections[idx])
    }

    pub fn collections(&self) -> &[CollectionDefinition] {
        &self.collections
    }

    /// Collection ids in declaration order.
    pub fn collection_ids(&self) -> Vec<String> {
        self.collections
            .iter()
            .filter_map(|c| c.id.clone())
            .collect()
    }
}
