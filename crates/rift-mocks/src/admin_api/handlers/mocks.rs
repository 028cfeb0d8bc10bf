//! Mocks handlers: routes, variants, collections and custom route variants.

use crate::admin_api::types::*;
use crate::mocks::MocksError;
use crate::response::{build_response, error_response, json_response};
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

fn mocks_error(err: MocksError) -> Response<Full<Bytes>> {
    error_response(StatusCode::NOT_FOUND, &err.to_string())
}

/// GET /admin/routes
pub fn handle_routes(state: &AdminState) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &state.mocks.plain_routes())
}

/// GET /admin/variants
pub fn handle_variants(state: &AdminState) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &state.mocks.plain_variants())
}

/// GET /admin/collections
pub fn handle_collections(state: &AdminState) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &state.mocks.plain_collections())
}

/// GET /admin/collections/current
pub fn handle_get_current(state: &AdminState) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &CurrentCollection {
            id: state.mocks.current(),
        },
    )
}

/// PUT /admin/collections/current
pub fn handle_set_current(body: &Bytes, state: &AdminState) -> Response<Full<Bytes>> {
    let request: CurrentCollection = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, &format!("Invalid collection JSON: {e}"))
        }
    };
    let Some(id) = request.id else {
        return error_response(StatusCode::BAD_REQUEST, "Field 'id' is required");
    };
    match state.mocks.set_current(&id) {
        Ok(()) => handle_get_current(state),
        Err(e) => mocks_error(e),
    }
}

/// GET /admin/collections/current/variants
pub fn handle_current_variants(state: &AdminState) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &state.mocks.current_route_variants())
}

/// GET /admin/custom-route-variants
pub fn handle_custom_variants(state: &AdminState) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &state.mocks.custom_route_variants())
}

/// POST /admin/custom-route-variants
pub fn handle_use_variants(body: &Bytes, state: &AdminState) -> Response<Full<Bytes>> {
    let request: UseVariantsRequest = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                &format!("Expected {{\"id\": ...}} or {{\"ids\": [...]}}: {e}"),
            )
        }
    };
    match state.mocks.use_route_variants(request.into_ids()) {
        Ok(()) => handle_custom_variants(state),
        Err(e) => mocks_error(e),
    }
}

/// DELETE /admin/custom-route-variants
pub fn handle_restore_variants(state: &AdminState) -> Response<Full<Bytes>> {
    state.mocks.restore_route_variants();
    build_response(StatusCode::NO_CONTENT, "")
}
