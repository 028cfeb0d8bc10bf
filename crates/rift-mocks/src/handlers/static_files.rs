//! `static` handler kind: serve files from a directory below the route url.

use super::{HandlerError, HandlerFactory, MockRequest, Outcome, VariantHandler};
use crate::definitions::{RouteDefinition, ValidationError, VariantDefinition};
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Empty, Full};
use hyper::header::{HeaderName, HeaderValue, LOCATION};
use hyper::{Method, Request, Response, StatusCode};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tracing::debug;

/// Factory for the `static` kind.
///
/// Payload: `path` (directory, required), `headers` (object, optional).
/// Files are served by `tower_http`'s `ServeDir`: percent-decoded paths,
/// content type from the extension, `index.html` for directories.
pub struct StaticFactory;

impl HandlerFactory for StaticFactory {
    fn kind(&self) -> &str {
        "static"
    }

    fn validate(&self, variant: &VariantDefinition) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        match variant.payload.get("path") {
            None => errors.push(ValidationError::new("path", "Missing required field 'path'")),
            Some(path) if !path.is_string() => {
                errors.push(ValidationError::new("path", "'path' must be a string"))
            }
            Some(_) => {}
        }
        if let Some(headers) = variant.payload.get("headers") {
            let all_strings = headers
                .as_object()
                .map(|map| map.values().all(|v| v.is_string()));
            if all_strings != Some(true) {
                errors.push(ValidationError::new(
                    "headers",
                    "'headers' must be an object of strings",
                ));
            }
        }
        if variant.responder.is_some() {
            errors.push(ValidationError::new(
                "response",
                "Handler 'static' does not accept a function response",
            ));
        }
        errors
    }

    fn create(
        &self,
        _route: &RouteDefinition,
        variant: &VariantDefinition,
    ) -> Result<Arc<dyn VariantHandler>, HandlerError> {
        let root = variant
            .payload
            .get("path")
            .and_then(|v| v.as_str())
            .map(PathBuf::from)
            .ok_or_else(|| HandlerError::InvalidPayload("'path' is required".to_string()))?;

        if !root.is_dir() {
            return Err(HandlerError::MissingDirectory(root));
        }

        let headers = variant
            .payload
            .get("headers")
            .and_then(|v| v.as_object())
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Arc::new(StaticHandler {
            service: ServeDir::new(&root),
            root,
            headers,
        }))
    }
}

struct StaticHandler {
    root: PathBuf,
    headers: HashMap<String, String>,
    service: ServeDir,
}

impl StaticHandler {
    /// Request for the file service: the path below the mount, still
    /// percent-encoded, with the caller's headers (ranges, conditionals).
    fn file_request(&self, request: &MockRequest) -> Option<Request<Empty<Bytes>>> {
        let relative = request.relative_path();
        let uri = if relative.starts_with('/') {
            relative.to_string()
        } else {
            format!("/{relative}")
        };
        let mut builder = Request::builder().method(request.method.clone()).uri(uri);
        if let Some(headers) = builder.headers_mut() {
            headers.extend(request.headers.clone());
        }
        builder.body(Empty::new()).ok()
    }
}

#[async_trait]
impl VariantHandler for StaticHandler {
    async fn handle(&self, request: &MockRequest) -> Outcome {
        if request.method != Method::GET && request.method != Method::HEAD {
            return Outcome::Next;
        }

        let Some(file_request) = self.file_request(request) else {
            debug!("Rejected static path '{}'", request.path);
            return Outcome::Next;
        };

        let response = match self.service.clone().oneshot(file_request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        if response.status() == StatusCode::NOT_FOUND {
            debug!(
                "No static file for '{}' below {}",
                request.path,
                self.root.display()
            );
            return Outcome::Next;
        }

        let (mut parts, body) = response.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                debug!("Static file for '{}' not served: {}", request.path, e);
                return Outcome::Next;
            }
        };

        // Directory redirects are relative to the mount, not the directory root
        let mounted = parts
            .headers
            .get(LOCATION)
            .and_then(|location| location.to_str().ok())
            .map(|location| format!("{}{}", request.base_path, location));
        if let Some(value) = mounted.and_then(|l| HeaderValue::from_str(&l).ok()) {
            parts.headers.insert(LOCATION, value);
        }

        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::try_from(name.as_str()),
                HeaderValue::from_str(value),
            ) {
                parts.headers.insert(name, value);
            }
        }

        Outcome::Respond(Response::from_parts(parts, Full::new(body)))
    }

    fn mounts_prefix(&self) -> bool {
        true
    }

    fn preview(&self) -> serde_json::Value {
        serde_json::json!({ "path": self.root.display().to_string() })
    }
}
