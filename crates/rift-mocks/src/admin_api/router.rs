//! Route dispatch logic for the Admin API.

use crate::admin_api::handlers::{mocks, system};
use crate::admin_api::types::{collect_body, AdminState};
use crate::response::{error_response, not_found};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use tracing::debug;

/// Main request router
pub async fn route_request(
    req: Request<Incoming>,
    state: AdminState,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("Admin API: {} {}", method, path);

    let body = match collect_body(req).await {
        Ok(b) => b,
        Err(e) => return Ok(error_response(StatusCode::BAD_REQUEST, &e)),
    };
    Ok(route_by_path(&method, &path, &body, &state).await)
}

/// Route based on method and path
pub async fn route_by_path(
    method: &Method,
    path: &str,
    body: &Bytes,
    state: &AdminState,
) -> Response<Full<Bytes>> {
    let path = match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    };

    match (method, path) {
        (&Method::GET, "/health") => system::handle_health(),
        (&Method::GET, "/admin/about") => system::handle_about(),
        (&Method::GET, "/admin/alerts") => system::handle_alerts(state),
        (&Method::GET, "/admin/settings") => system::handle_get_settings(state),
        (&Method::PATCH, "/admin/settings") => system::handle_patch_settings(body, state),
        (&Method::POST, "/admin/reload") => system::handle_reload(state).await,

        (&Method::GET, "/admin/routes") => mocks::handle_routes(state),
        (&Method::GET, "/admin/variants") => mocks::handle_variants(state),
        (&Method::GET, "/admin/collections") => mocks::handle_collections(state),
        (&Method::GET, "/admin/collections/current") => mocks::handle_get_current(state),
        (&Method::PUT, "/admin/collections/current") => mocks::handle_set_current(body, state),
        (&Method::GET, "/admin/collections/current/variants") => {
            mocks::handle_current_variants(state)
        }
        (&Method::GET, "/admin/custom-route-variants") => mocks::handle_custom_variants(state),
        (&Method::POST, "/admin/custom-route-variants") => mocks::handle_use_variants(body, state),
        (&Method::DELETE, "/admin/custom-route-variants") => {
            mocks::handle_restore_variants(state)
        }

        _ => not_found(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::Alerts;
    use crate::config::GlobalDelay;
    use crate::definitions::{CollectionDefinition, RouteDefinition, VariantDefinition};
    use crate::mocks::Mocks;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn state() -> AdminState {
        let alerts = Arc::new(Alerts::new());
        let delay = GlobalDelay::new(0);
        let mocks = Arc::new(Mocks::new(
            Arc::new(alerts.scoped("mocks")),
            delay.provider(),
        ));
        mocks.load(
            vec![RouteDefinition::new("r1", "GET", "/x")
                .with_variant(VariantDefinition::new("v1").with_response(200, json!({})))
                .with_variant(VariantDefinition::new("v2").with_response(500, json!({})))],
            vec![
                CollectionDefinition::new("a", ["r1:v1"]),
                CollectionDefinition::new("b", ["r1:v2"]),
            ],
        );
        AdminState::new(mocks, alerts, delay)
    }

    async fn call(state: &AdminState, method: Method, path: &str, body: Value) -> (u16, Value) {
        let body = if body.is_null() {
            Bytes::new()
        } else {
            Bytes::from(body.to_string())
        };
        let response = route_by_path(&method, path, &body, state).await;
        let status = response.status().as_u16();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health_and_about() {
        let state = state();
        let (status, body) = call(&state, Method::GET, "/health", Value::Null).await;
        assert_eq!(status, 200);
        assert_eq!(body["status"], "ok");
        let (_, body) = call(&state, Method::GET, "/admin/about/", Value::Null).await;
        assert_eq!(body["name"], "rift-mocks");
    }

    #[tokio::test]
    async fn test_collections_current() {
        let state = state();
        let (_, body) = call(&state, Method::GET, "/admin/collections/current", Value::Null).await;
        assert_eq!(body["id"], "a");

        let (status, body) = call(
            &state,
            Method::PUT,
            "/admin/collections/current",
            json!({"id": "b"}),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(body["id"], "b");

        let (status, body) = call(
            &state,
            Method::PUT,
            "/admin/collections/current",
            json!({"id": "missing"}),
        )
        .await;
        assert_eq!(status, 404);
        assert!(body["errors"][0]["message"]
            .as_str()
            .unwrap()
            .contains("missing"));
        assert_eq!(state.mocks.current().as_deref(), Some("b"));

        let (status, _) = call(
            &state,
            Method::PUT,
            "/admin/collections/current",
            json!({"name": "b"}),
        )
        .await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_custom_route_variants() {
        let state = state();
        let (status, body) = call(
            &state,
            Method::POST,
            "/admin/custom-route-variants",
            json!({"id": "r1:v2"}),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(body, json!(["r1:v2"]));

        let (_, body) = call(
            &state,
            Method::GET,
            "/admin/collections/current/variants",
            Value::Null,
        )
        .await;
        assert_eq!(body, json!(["r1:v2"]));

        let (status, _) = call(
            &state,
            Method::POST,
            "/admin/custom-route-variants",
            json!({"ids": ["r1:v1", "r9:v1"]}),
        )
        .await;
        assert_eq!(status, 404);

        let (status, _) = call(
            &state,
            Method::DELETE,
            "/admin/custom-route-variants",
            Value::Null,
        )
        .await;
        assert_eq!(status, 204);
        assert!(state.mocks.custom_route_variants().is_empty());
    }

    #[tokio::test]
    async fn test_settings() {
        let state = state();
        let (status, body) = call(
            &state,
            Method::PATCH,
            "/admin/settings",
            json!({"delay": 750, "collection": "b"}),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(body, json!({"delay": 750, "collection": "b"}));
        assert_eq!(state.delay.get(), 750);

        let (status, _) = call(&state, Method::PATCH, "/admin/settings", json!({"delay": -1})).await;
        assert_eq!(status, 400);
        assert_eq!(state.delay.get(), 750);
    }

    #[tokio::test]
    async fn test_listings_and_alerts() {
        let state = state();
        let (_, routes) = call(&state, Method::GET, "/admin/routes", Value::Null).await;
        assert_eq!(routes[0]["id"], "r1");
        let (_, variants) = call(&state, Method::GET, "/admin/variants", Value::Null).await;
        assert_eq!(variants.as_array().unwrap().len(), 2);
        let (_, collections) = call(&state, Method::GET, "/admin/collections", Value::Null).await;
        assert_eq!(collections[1]["routesVariants"], json!(["r1:v2"]));

        // No collection configured: the fallback is reported
        let (_, alerts) = call(&state, Method::GET, "/admin/alerts", Value::Null).await;
        assert_eq!(alerts[0]["id"], "mocks:settings");
    }

    #[tokio::test]
    async fn test_reload_without_loader_and_unknown_paths() {
        let state = state();
        let (status, _) = call(&state, Method::POST, "/admin/reload", Value::Null).await;
        assert_eq!(status, 503);
        let (status, _) = call(&state, Method::GET, "/admin/nope", Value::Null).await;
        assert_eq!(status, 404);
        let (status, _) = call(&state, Method::DELETE, "/admin/routes", Value::Null).await;
        assert_eq!(status, 404);
    }
}
