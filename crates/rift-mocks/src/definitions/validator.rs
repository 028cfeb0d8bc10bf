//! Structural validation of route and collection definitions.
//!
//! Validation never fails: it returns a list of [`ValidationError`]s per
//! definition. A definition with at least one error is left out of the pool
//! used for resolution, the rest carry on.

use super::{
    split_variant_key, CollectionDefinition, RouteDefinition, UrlPattern, ANY_VERB, HTTP_VERBS,
};
use crate::handlers::HandlerRegistry;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// A single structural problem found in a definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Human-readable description
    pub message: String,
    /// Location inside the definition (e.g. `variants[1].response.status`)
    pub path: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: path.into(),
        }
    }

    /// Prefix the location with a parent path.
    pub fn nested(mut self, parent: &str) -> Self {
        self.path = if self.path.is_empty() {
            parent.to_string()
        } else {
            format!("{parent}.{}", self.path)
        };
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Outcome of validating a set of definitions.
#[derive(Debug)]
pub struct ValidationReport<T> {
    /// Definitions without errors, in declaration order
    pub valid: Vec<T>,
    /// `(entity label, errors)` for every dropped definition
    pub invalid: Vec<(String, Vec<ValidationError>)>,
}

impl<T> ValidationReport<T> {
    pub fn error_count(&self) -> usize {
        self.invalid.len()
    }
}

/// Validate one route against the registered handler kinds.
pub fn validate_route(route: &RouteDefinition, registry: &HandlerRegistry) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match route.id.as_deref() {
        None => errors.push(ValidationError::new("id", "Missing required field 'id'")),
        Some("") => errors.push(ValidationError::new("id", "Route id must not be empty")),
        Some(id) if id.contains(super::VARIANT_ID_SEPARATOR) => errors.push(ValidationError::new(
            "id",
            format!("Route id '{id}' must not contain ':'"),
        )),
        Some(_) => {}
    }

    match &route.url {
        None => errors.push(ValidationError::new("url", "Missing required field 'url'")),
        Some(UrlPattern::Path(path)) if path.is_empty() => {
            errors.push(ValidationError::new("url", "Route url must not be empty"))
        }
        Some(UrlPattern::Regex { regex }) => {
            if let Err(e) = regex::Regex::new(regex) {
                errors.push(ValidationError::new(
                    "url.regex",
                    format!("Invalid regular expression: {e}"),
                ));
            }
        }
        Some(UrlPattern::Path(_)) => {}
    }

    match &route.method {
        None => errors.push(ValidationError::new(
            "method",
            "Missing required field 'method'",
        )),
        Some(spec) => {
            let verbs = spec.verbs();
            if verbs.is_empty() {
                errors.push(ValidationError::new("method", "Method list must not be empty"));
            }
            for verb in verbs {
                if verb != ANY_VERB && !HTTP_VERBS.contains(&verb.as_str()) {
                    errors.push(ValidationError::new(
                        "method",
                        format!("Unknown HTTP method '{verb}'"),
                    ));
                }
            }
        }
    }

    if let Some(delay) = route.delay {
        if delay < 0 {
            errors.push(ValidationError::new(
                "delay",
                format!("Delay must be a non-negative integer, got {delay}"),
            ));
        }
    }

    if route.variants.is_empty() {
        errors.push(ValidationError::new(
            "variants",
            "Route must define at least one variant",
        ));
    }

    let mut seen_variants = HashSet::new();
    for (idx, variant) in route.variants.iter().enumerate() {
        let location = format!("variants[{idx}]");
        match variant.id.as_deref() {
            None | Some("") => errors.push(ValidationError::new(
                format!("{location}.id"),
                "Missing required field 'id'",
            )),
            Some(id) => {
                if !seen_variants.insert(id) {
                    errors.push(ValidationError::new(
                        format!("{location}.id"),
                        format!("Variant id '{id}' is used more than once in the same route"),
                    ));
                }
            }
        }

        if let Some(delay) = variant.delay {
            if delay < 0 {
                errors.push(ValidationError::new(
                    format!("{location}.delay"),
                    format!("Delay must be a non-negative integer, got {delay}"),
                ));
            }
        }

        let kind = variant.handler_kind();
        match registry.get(kind) {
            None => errors.push(ValidationError::new(
                format!("{location}.handler"),
                format!(
                    "Unknown handler kind '{kind}'. Registered kinds: {}",
                    registry.kinds().join(", ")
                ),
            )),
            Some(factory) => errors.extend(
                factory
                    .validate(variant)
                    .into_iter()
                    .map(|e| e.nested(&location)),
            ),
        }
    }

    errors
}

/// Validate one collection's shape.
///
/// References (`from`, variant ids) are checked during resolution, not here.
pub fn validate_collection(collection: &CollectionDefinition) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match collection.id.as_deref() {
        None => errors.push(ValidationError::new("id", "Missing required field 'id'")),
        Some("") => errors.push(ValidationError::new("id", "Collection id must not be empty")),
        Some(_) => {}
    }

    if let Some(from) = collection.from.as_deref() {
        if from.is_empty() {
            errors.push(ValidationError::new("from", "'from' must not be empty"));
        }
    }

    match &collection.routes_variants {
        None => errors.push(ValidationError::new(
            "routesVariants",
            "Missing required field 'routesVariants'",
        )),
        Some(entries) => {
            let mut seen = HashSet::new();
            for (idx, entry) in entries.iter().enumerate() {
                if split_variant_key(entry).is_none() {
                    errors.push(ValidationError::new(
                        format!("routesVariants[{idx}]"),
                        format!("'{entry}' is not a valid 'routeId:variantId' reference"),
                    ));
                }
                if !seen.insert(entry.as_str()) {
                    errors.push(ValidationError::new(
                        format!("routesVariants[{idx}]"),
                        format!("'{entry}' is listed more than once"),
                    ));
                }
            }
        }
    }

    errors
}

/// Validate every route, dropping invalid ones and duplicated ids.
pub fn validate_routes(
    routes: Vec<RouteDefinition>,
    registry: &HandlerRegistry,
) -> ValidationReport<RouteDefinition> {
    let mut report = ValidationReport {
        valid: Vec::with_capacity(routes.len()),
        invalid: Vec::new(),
    };
    let mut ids = HashSet::new();

    for (idx, route) in routes.into_iter().enumerate() {
        let label = entity_label(route.id.as_deref(), idx);
        let mut errors = validate_route(&route, registry);
        if let Some(id) = route.id.as_deref() {
            if !ids.insert(id.to_string()) {
                errors.push(ValidationError::new(
                    "id",
                    format!("Route id '{id}' is already defined"),
                ));
            }
        }
        if errors.is_empty() {
            report.valid.push(route);
        } else {
            report.invalid.push((label, errors));
        }
    }

    report
}

/// Validate every collection, dropping invalid ones and duplicated ids.
pub fn validate_collections(
    collections: Vec<CollectionDefinition>,
) -> ValidationReport<CollectionDefinition> {
    let mut report = ValidationReport {
        valid: Vec::with_capacity(collections.len()),
        invalid: Vec::new(),
    };
    let mut ids = HashSet::new();

    for (idx, collection) in collections.into_iter().enumerate() {
        let label = entity_label(collection.id.as_deref(), idx);
        let mut errors = validate_collection(&collection);
        if let Some(id) = collection.id.as_deref() {
            if !ids.insert(id.to_string()) {
                errors.push(ValidationError::new(
                    "id",
                    format!("Collection id '{id}' is already defined"),
                ));
            }
        }
        if errors.is_empty() {
            report.valid.push(collection);
        } else {
            report.invalid.push((label, errors));
        }
    }

    report
}

fn entity_label(id: Option<&str>, idx: usize) -> String {
    match id {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => format!("#{idx}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::{MethodSpec, VariantDefinition};
    use serde_json::json;

    fn registry() -> HandlerRegistry {
        HandlerRegistry::with_defaults()
    }

    fn valid_route(id: &str) -> RouteDefinition {
        RouteDefinition::new(id, "GET", "/x")
            .with_variant(VariantDefinition::new("v1").with_response(200, json!({})))
    }

    #[test]
    fn test_valid_route_has_no_errors() {
        assert!(validate_route(&valid_route("r1"), &registry()).is_empty());
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let route = RouteDefinition::default();
        let errors = validate_route(&route, &registry());
        let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"id"));
        assert!(paths.contains(&"url"));
        assert!(paths.contains(&"method"));
        assert!(paths.contains(&"variants"));
    }

    #[test]
    fn test_unknown_handler_kind() {
        let route = RouteDefinition::new("r1", "GET", "/x")
            .with_variant(VariantDefinition::new("v1").with_handler("graphql"));
        let errors = validate_route(&route, &registry());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "variants[0].handler");
        assert!(errors[0].message.contains("Unknown handler kind 'graphql'"));
    }

    #[test]
    fn test_handler_payload_errors_are_nested() {
        let route = RouteDefinition::new("r1", "GET", "/x").with_variant(
            VariantDefinition::new("v1").with_payload("response", json!({"status": 42})),
        );
        let errors = validate_route(&route, &registry());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "variants[0].response.status");
    }

    #[test]
    fn test_bad_method_and_negative_delay() {
        let mut route = valid_route("r1").with_delay(-5);
        route.method = Some(MethodSpec::Many(vec!["GET".into(), "FETCH".into()]));
        let errors = validate_route(&route, &registry());
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.message.contains("'fetch'")));
        assert!(errors.iter().any(|e| e.path == "delay"));
    }

    #[test]
    fn test_duplicate_variant_ids_in_route() {
        let route = valid_route("r1")
            .with_variant(VariantDefinition::new("v1").with_response(500, json!({})));
        let errors = validate_route(&route, &registry());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "variants[1].id");
    }

    #[test]
    fn test_invalid_regex_url() {
        let mut route = valid_route("r1");
        route.url = Some(UrlPattern::Regex {
            regex: "([a-z".to_string(),
        });
        let errors = validate_route(&route, &registry());
        assert_eq!(errors[0].path, "url.regex");
    }

    #[test]
    fn test_collection_validation() {
        assert!(validate_collection(&CollectionDefinition::new("base", ["r1:v1"])).is_empty());

        let errors = validate_collection(&CollectionDefinition::default());
        assert_eq!(errors.len(), 2);

        let errors = validate_collection(&CollectionDefinition::new(
            "dup",
            ["r1:v1", "r1:v1", "nope"],
        ));
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].path, "routesVariants[1]");
        assert_eq!(errors[1].path, "routesVariants[2]");
    }

    #[test]
    fn test_validate_routes_keeps_processing_after_errors() {
        let report = validate_routes(
            vec![
                valid_route("r1"),
                RouteDefinition::default(),
                valid_route("r1"),
                valid_route("r2"),
            ],
            &registry(),
        );
        let valid: Vec<_> = report.valid.iter().filter_map(|r| r.id.clone()).collect();
        assert_eq!(valid, vec!["r1", "r2"]);
        assert_eq!(report.error_count(), 2);
        assert_eq!(report.invalid[0].0, "#1");
        assert_eq!(report.invalid[1].0, "r1");
    }

    #[test]
    fn test_validate_collections_rejects_duplicate_ids() {
        let report = validate_collections(vec![
            CollectionDefinition::new("a", ["r1:v1"]),
            CollectionDefinition::new("a", ["r1:v2"]),
        ]);
        assert_eq!(report.valid.len(), 1);
        assert_eq!(report.invalid.len(), 1);
        assert!(report.invalid[0].1[0].message.contains("already defined"));
    }
}
