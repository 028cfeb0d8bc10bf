//! Collection resolution.
//!
//! Turns a collection id into the ordered list of active route variants:
//! the collection's own entries first (one per route, first wins), then the
//! entries inherited through `from` for routes the child does not mention,
//! then runtime overrides on top of everything.
//!
//! Resolution is a pure function of a [`DefinitionIndex`] snapshot and an
//! [`OverrideSet`]; problems are collected, never fatal.

use super::index::{DefinitionIndex, RouteVariant};
use super::overrides::OverrideSet;
use std::collections::HashSet;
use std::sync::Arc;

/// A reference that could not be honoured during resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("Collection '{0}' was not found")]
    CollectionNotFound(String),
    #[error("Collection '{collection}': route variant '{variant}' was not found")]
    VariantNotFound { collection: String, variant: String },
    #[error("Collection '{collection}': route '{route}' is used more than once in the same collection")]
    DuplicateRoute { collection: String, route: String },
    #[error("Collection '{collection}': collection '{from}' defined in 'from' was not found")]
    ParentNotFound { collection: String, from: String },
    #[error("Collection '{collection}': circular 'from' reference ({})", .chain.join(" -> "))]
    Cycle {
        collection: String,
        chain: Vec<String>,
    },
    #[error("Custom route variant '{0}' was not found")]
    OverrideNotFound(String),
}

impl ResolveError {
    /// Stable alert id for this problem.
    pub fn alert_id(&self) -> String {
        match self {
            ResolveError::CollectionNotFound(id) => format!("collections:{id}"),
            ResolveError::VariantNotFound {
                collection,
                variant,
            } => format!("collections:{collection}:variants:{variant}"),
            ResolveError::DuplicateRoute { collection, route } => {
                format!("collections:{collection}:duplicated:{route}")
            }
            ResolveError::ParentNotFound { collection, .. } => {
                format!("collections:{collection}:from")
            }
            ResolveError::Cycle { collection, .. } => format!("collections:{collection}:cycle"),
            ResolveError::OverrideNotFound(id) => format!("custom-variants:{id}"),
        }
    }
}

/// Result of resolving one collection.
#[derive(Debug, Default)]
pub struct Resolution {
    pub variants: Vec<Arc<RouteVariant>>,
    pub errors: Vec<ResolveError>,
}

impl Resolution {
    pub fn variant_ids(&self) -> Vec<String> {
        self.variants.iter().map(|v| v.id.clone()).collect()
    }
}

/// Resolve `collection_id` against `index`, then apply `overrides`.
///
/// Overrides replace the entry of their route in place; overrides for routes
/// the collection does not use are appended.
pub fn resolve(collection_id: &str, index: &DefinitionIndex, overrides: &OverrideSet) -> Resolution {
    let mut resolution = Resolution::default();
    let mut chain = Vec::new();
    resolution.variants = resolve_chain(collection_id, index, &mut chain, &mut resolution.errors);

    for (route_id, variant_id) in overrides.iter() {
        let Some(forced) = index.variant(variant_id) else {
            resolution
                .errors
                .push(ResolveError::OverrideNotFound(variant_id.to_string()));
            continue;
        };
        match resolution
            .variants
            .iter()
            .position(|v| v.route_id == route_id)
        {
            Some(pos) => resolution.variants[pos] = Arc::clone(forced),
            None => resolution.variants.push(Arc::clone(forced)),
        }
    }

    resolution
}

fn resolve_chain(
    collection_id: &str,
    index: &DefinitionIndex,
    chain: &mut Vec<String>,
    errors: &mut Vec<ResolveError>,
) -> Vec<Arc<RouteVariant>> {
    let Some(collection) = index.collection(collection_id) else {
        errors.push(ResolveError::CollectionNotFound(collection_id.to_string()));
        return Vec::new();
    };

    let mut own = Vec::new();
    let mut routes = HashSet::new();
    for entry in collection.routes_variants.iter().flatten() {
        let Some(variant) = index.variant(entry) else {
            errors.push(ResolveError::VariantNotFound {
                collection: collection_id.to_string(),
                variant: entry.clone(),
            });
            continue;
        };
        if !routes.insert(variant.route_id.clone()) {
            errors.push(ResolveError::DuplicateRoute {
                collection: collection_id.to_string(),
                route: variant.route_id.clone(),
            });
            continue;
        }
        own.push(Arc::clone(variant));
    }

    let Some(from) = collection.from.as_deref() else {
        return own;
    };

    chain.push(collection_id.to_string());
    if chain.iter().any(|id| id == from) {
        let mut cycle = chain.clone();
        cycle.push(from.to_string());
        errors.push(ResolveError::Cycle {
            collection: collection_id.to_string(),
            chain: cycle,
        });
    } else if index.collection(from).is_none() {
        errors.push(ResolveError::ParentNotFound {
            collection: collection_id.to_string(),
            from: from.to_string(),
        });
    } else {
        let inherited = resolve_chain(from, index, chain, errors);
        own.extend(
            inherited
                .into_iter()
                .filter(|variant| !routes.contains(&variant.route_id)),
        );
    }
    chain.pop();

    own
}
