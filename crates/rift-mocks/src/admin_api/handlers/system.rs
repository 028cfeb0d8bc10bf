//! System handlers: health, about, alerts, settings, reload.

use crate::admin_api::types::*;
use crate::response::{error_response, json_response};
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use tracing::info;

/// GET /health - Health check
pub fn handle_health() -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &serde_json::json!({"status": "ok"}))
}

/// GET /admin/about
pub fn handle_about() -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &AboutResponse {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}

/// GET /admin/alerts
pub fn handle_alerts(state: &AdminState) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &state.alerts.list())
}

/// GET /admin/settings
pub fn handle_get_settings(state: &AdminState) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &SettingsResponse {
            delay: state.delay.get(),
            collection: state.mocks.current(),
        },
    )
}

/// PATCH /admin/settings
pub fn handle_patch_settings(body: &Bytes, state: &AdminState) -> Response<Full<Bytes>> {
    let patch: SettingsPatch = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, &format!("Invalid settings JSON: {e}"))
        }
    };

    if let Some(delay) = patch.delay {
        if delay < 0 {
            return error_response(
                StatusCode::BAD_REQUEST,
                &format!("Invalid delay {delay}: must be zero or positive"),
            );
        }
    }
    if let Some(collection) = &patch.collection {
        if let Err(e) = state.mocks.set_current(collection) {
            return error_response(StatusCode::NOT_FOUND, &e.to_string());
        }
    }
    if let Some(delay) = patch.delay {
        info!("Global delay set to {}ms", delay);
        state.delay.set(delay);
    }

    handle_get_settings(state)
}

/// POST /admin/reload - Read the mocks folder again
pub async fn handle_reload(state: &AdminState) -> Response<Full<Bytes>> {
    let Some(loader) = &state.loader else {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Definitions were not loaded from a mocks folder",
        );
    };
    match loader.reload_blocking(&state.mocks).await {
        Ok(()) => handle_get_settings(state),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

