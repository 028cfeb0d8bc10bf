//! Tests for the `Mocks` holder.
//!
//! Covers:
//! - Collection selection and fallback on load
//! - Runtime overrides and restore
//! - Change notification
//! - Alerts raised for invalid definitions and cyclic collections

use super::*;
use crate::alerts::{AlertSink, Alerts};
use crate::definitions::{CollectionDefinition, RouteDefinition, VariantDefinition};
use crate::handlers::{MockRequest, Outcome};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn routes() -> Vec<RouteDefinition> {
    vec![
        RouteDefinition::new("r1", "GET", "/x")
            .with_variant(VariantDefinition::new("v1").with_response(200, json!({"v": 1})))
            .with_variant(VariantDefinition::new("v2").with_response(201, json!({"v": 2}))),
        RouteDefinition::new("r2", "GET", "/y")
            .with_variant(VariantDefinition::new("v1").with_response(200, json!({})))
            .with_variant(VariantDefinition::new("v2").with_response(500, json!({}))),
    ]
}

fn collections() -> Vec<CollectionDefinition> {
    vec![
        CollectionDefinition::new("a", ["r1:v1", "r2:v1"]),
        CollectionDefinition::new("b", ["r2:v2"]).with_from("a"),
    ]
}

fn mocks() -> (Mocks, Arc<Alerts>) {
    let alerts = Arc::new(Alerts::new());
    let mocks = Mocks::new(Arc::new(alerts.scoped("mocks")), fixed_delay(0));
    (mocks, alerts)
}

async fn status(mocks: &Mocks, path: &str) -> Option<u16> {
    match mocks.dispatch(MockRequest::get(path)).await {
        Outcome::Respond(response) => Some(response.status().as_u16()),
        Outcome::Next => None,
    }
}

#[tokio::test]
async fn test_unloaded_router_passes_everything() {
    let (mocks, _) = mocks();
    assert!(mocks.router().is_empty());
    assert_eq!(mocks.current(), None);
    assert_eq!(status(&mocks, "/x").await, None);
}

#[tokio::test]
async fn test_load_without_selection_uses_first_collection() {
    let (mocks, alerts) = mocks();
    mocks.load(routes(), collections());

    assert_eq!(mocks.current().as_deref(), Some("a"));
    assert_eq!(mocks.ids(), vec!["a", "b"]);
    let alert = alerts.get("mocks:settings").unwrap();
    assert!(alert.message.contains("was not defined"));
    assert_eq!(status(&mocks, "/x").await, Some(200));
}

#[tokio::test]
async fn test_selection_before_load_is_applied() {
    let (mocks, alerts) = mocks();
    mocks.set_current("b").unwrap();
    assert_eq!(mocks.current(), None);

    mocks.load(routes(), collections());
    assert_eq!(mocks.current().as_deref(), Some("b"));
    assert!(alerts.get("mocks:settings").is_none());
    assert_eq!(mocks.current_route_variants(), vec!["r2:v2", "r1:v1"]);
    assert_eq!(status(&mocks, "/y").await, Some(500));
}

#[tokio::test]
async fn test_load_falls_back_when_selection_disappears() {
    let (mocks, alerts) = mocks();
    mocks.load(
        routes(),
        vec![
            CollectionDefinition::new("a", ["r1:v1"]),
            CollectionDefinition::new("gone", ["r1:v2"]),
        ],
    );
    mocks.set_current("gone").unwrap();
    assert_eq!(status(&mocks, "/x").await, Some(201));

    mocks.load(routes(), collections());
    assert_eq!(mocks.current().as_deref(), Some("a"));
    let alert = alerts.get("mocks:settings").unwrap();
    assert!(alert.message.contains("was not found"));
    assert_eq!(status(&mocks, "/x").await, Some(200));

    // Picked again once it comes back
    mocks.load(
        routes(),
        vec![
            CollectionDefinition::new("a", ["r1:v1"]),
            CollectionDefinition::new("gone", ["r1:v2"]),
        ],
    );
    assert_eq!(mocks.current().as_deref(), Some("gone"));
}

#[tokio::test]
async fn test_set_current_unknown_keeps_previous() {
    let (mocks, alerts) = mocks();
    mocks.load(routes(), collections());

    let err = mocks.set_current("missing").unwrap_err();
    assert_eq!(err, MocksError::CollectionNotFound("missing".to_string()));
    assert_eq!(mocks.current().as_deref(), Some("a"));
    assert!(alerts.get("mocks:settings").is_some());
    assert_eq!(status(&mocks, "/x").await, Some(200));

    mocks.set_current("b").unwrap();
    assert_eq!(mocks.current().as_deref(), Some("b"));
    assert!(alerts.get("mocks:settings").is_none());
}

#[tokio::test]
async fn test_use_route_variant_overrides_collection() {
    let (mocks, _) = mocks();
    mocks.load(routes(), collections());

    mocks.use_route_variant("r1:v2").unwrap();
    assert_eq!(mocks.custom_route_variants(), vec!["r1:v2"]);
    assert_eq!(status(&mocks, "/x").await, Some(201));

    // Survives a collection change
    mocks.set_current("b").unwrap();
    assert_eq!(status(&mocks, "/x").await, Some(201));
    assert_eq!(status(&mocks, "/y").await, Some(500));
}

#[tokio::test]
async fn test_use_route_variants_is_all_or_nothing() {
    let (mocks, alerts) = mocks();
    mocks.load(routes(), collections());

    let err = mocks
        .use_route_variants(["r1:v2", "r2:nope"])
        .unwrap_err();
    assert_eq!(err, MocksError::VariantNotFound("r2:nope".to_string()));
    assert!(mocks.custom_route_variants().is_empty());
    assert!(alerts.get("mocks:override").is_some());
    assert_eq!(status(&mocks, "/x").await, Some(200));

    mocks.use_route_variants(["r1:v2", "r2:v2"]).unwrap();
    assert!(alerts.get("mocks:override").is_none());
    assert_eq!(mocks.custom_route_variants(), vec!["r1:v2", "r2:v2"]);
}

#[tokio::test]
async fn test_restore_route_variants() {
    let (mocks, _) = mocks();
    mocks.load(routes(), collections());
    mocks.use_route_variant("r1:v2").unwrap();
    mocks.use_route_variant("r2:v2").unwrap();
    mocks.use_route_variant("r1:v1").unwrap();
    assert_eq!(mocks.custom_route_variants(), vec!["r1:v1", "r2:v2"]);

    mocks.restore_route_variants();
    assert!(mocks.custom_route_variants().is_empty());
    assert_eq!(mocks.current_route_variants(), vec!["r1:v1", "r2:v1"]);
    assert_eq!(status(&mocks, "/y").await, Some(200));
}

#[tokio::test]
async fn test_overrides_survive_reload() {
    let (mocks, alerts) = mocks();
    mocks.load(routes(), collections());
    mocks.use_route_variant("r1:v2").unwrap();

    mocks.load(routes(), collections());
    assert_eq!(status(&mocks, "/x").await, Some(201));

    // Variant removed by a reload: reported, the collection entry is served
    let trimmed = vec![RouteDefinition::new("r1", "GET", "/x")
        .with_variant(VariantDefinition::new("v1").with_response(200, json!({})))];
    mocks.load(trimmed, vec![CollectionDefinition::new("a", ["r1:v1"])]);
    assert!(alerts.get("mocks:custom-variants:r1:v2").is_some());
    assert_eq!(status(&mocks, "/x").await, Some(200));

    mocks.restore_route_variants();
    assert!(alerts.get("mocks:custom-variants:r1:v2").is_none());
}

#[tokio::test]
async fn test_empty_collections() {
    let (mocks, alerts) = mocks();
    mocks.load(routes(), vec![]);
    assert_eq!(mocks.current(), None);
    assert!(mocks.router().is_empty());
    assert!(alerts.get("mocks:empty").is_some());
    assert_eq!(status(&mocks, "/x").await, None);

    mocks.load(routes(), collections());
    assert!(alerts.get("mocks:empty").is_none());
    assert_eq!(mocks.current().as_deref(), Some("a"));
}

#[test]
fn test_on_change_fires_for_every_publication() {
    let (mocks, _) = mocks();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let id = mocks.on_change(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    mocks.load(routes(), collections());
    mocks.set_current("b").unwrap();
    mocks.use_route_variant("r1:v2").unwrap();
    mocks.restore_route_variants();
    assert_eq!(calls.load(Ordering::SeqCst), 4);

    // Failed operations publish nothing
    assert!(mocks.set_current("missing").is_err());
    assert!(mocks.use_route_variant("r9:v9").is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 4);

    assert!(mocks.remove_listener(id));
    assert!(!mocks.remove_listener(id));
    mocks.restore_route_variants();
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[test]
fn test_listener_can_read_holder() {
    let (mocks, _) = mocks();
    let mocks = Arc::new(mocks);
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    {
        let weak = Arc::downgrade(&mocks);
        let seen = Arc::clone(&seen);
        mocks.on_change(move || {
            if let Some(mocks) = weak.upgrade() {
                seen.lock().push(mocks.current());
            }
        });
    }
    mocks.load(routes(), collections());
    mocks.set_current("b").unwrap();
    assert_eq!(
        *seen.lock(),
        vec![Some("a".to_string()), Some("b".to_string())]
    );
}

#[test]
fn test_invalid_definitions_raise_alerts() {
    let (mocks, alerts) = mocks();
    let mut broken = RouteDefinition::new("broken", "FETCH", "/z")
        .with_variant(VariantDefinition::new("v1").with_response(200, json!({})));
    broken.delay = Some(-1);
    let mut all_routes = routes();
    all_routes.push(broken);

    mocks.load(
        all_routes,
        vec![
            CollectionDefinition::new("a", ["r1:v1", "broken:v1"]),
            CollectionDefinition::new("orphan", ["r2:v1"]).with_from("ghost"),
            CollectionDefinition {
                id: Some("no-routes".to_string()),
                from: None,
                routes_variants: None,
            },
        ],
    );

    assert!(alerts.get("mocks:validation:routes:broken").is_some());
    assert!(alerts
        .get("mocks:validation:collections:no-routes")
        .is_some());
    assert!(alerts
        .get("mocks:collections:a:variants:broken:v1")
        .is_some());
    assert!(alerts.get("mocks:collections:orphan:from").is_some());
    let critical = alerts.get("mocks:critical-error").unwrap();
    assert_eq!(critical.message, "Critical errors found while loading mocks: 4");

    // Valid parts keep working
    assert_eq!(mocks.current_route_variants(), vec!["r1:v1"]);
    assert_eq!(mocks.ids(), vec!["a", "orphan"]);
}

#[test]
fn test_cyclic_collections_are_alerted_and_counted() {
    let (mocks, alerts) = mocks();
    mocks.load(
        routes(),
        vec![
            CollectionDefinition::new("a", ["r1:v1"]).with_from("b"),
            CollectionDefinition::new("b", ["r2:v2"]).with_from("a"),
        ],
    );

    let cycle = alerts.get("mocks:collections:b:cycle").unwrap();
    assert!(cycle.message.contains("a -> b -> a"));
    assert!(alerts.get("mocks:collections:a:cycle").is_some());
    let critical = alerts.get("mocks:critical-error").unwrap();
    assert_eq!(critical.message, "Critical errors found while loading mocks: 2");

    // The chain is cut at the cycle, everything gathered before it is served
    assert_eq!(mocks.current().as_deref(), Some("a"));
    assert_eq!(mocks.current_route_variants(), vec!["r1:v1", "r2:v2"]);
}

#[test]
fn test_reload_cleans_only_own_alerts() {
    let alerts = Arc::new(Alerts::new());
    let mocks = Mocks::new(Arc::new(alerts.scoped("mocks")), fixed_delay(0));
    alerts.set("files:routes.json", "parse error", None);

    mocks.load(routes(), vec![]);
    assert!(alerts.get("mocks:empty").is_some());
    mocks.load(routes(), collections());
    assert!(alerts.get("mocks:empty").is_none());
    assert!(alerts.get("files:routes.json").is_some());
}

#[test]
fn test_duplicate_urls_are_reported() {
    let (mocks, alerts) = mocks();
    let mut all_routes = routes();
    all_routes.push(
        RouteDefinition::new("shadow", "GET", "/x")
            .with_variant(VariantDefinition::new("v1").with_response(418, json!({}))),
    );
    mocks.load(
        all_routes,
        vec![CollectionDefinition::new("a", ["r1:v1", "shadow:v1"])],
    );
    assert!(alerts.get("mocks:router:duplicated:get:/x").is_some());

    mocks.set_current("a").unwrap();
    mocks.use_route_variant("shadow:v1").unwrap();
    mocks.load(routes(), collections());
    assert!(alerts.get("mocks:router:duplicated:get:/x").is_none());
}

#[test]
fn test_plain_views() {
    let (mocks, _) = mocks();
    mocks.load(routes(), collections());

    let routes = mocks.plain_routes();
    assert_eq!(routes.len(), 2);
    assert_eq!(routes[0].variants, vec!["r1:v1", "r1:v2"]);

    let variants = mocks.plain_variants();
    assert_eq!(variants.len(), 4);
    assert_eq!(variants[1].preview["status"], 201);

    let collections = mocks.plain_collections();
    assert_eq!(collections[1].from.as_deref(), Some("a"));
    let json = serde_json::to_value(&collections[1]).unwrap();
    assert_eq!(json["routesVariants"], json!(["r2:v2"]));
}
