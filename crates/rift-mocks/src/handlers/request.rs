//! Request and response values exchanged with variant handlers.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{HeaderMap, Method, Response};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::response::ResponseBuilder;

/// Transport-independent view of an incoming request.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Named url parameters captured by the matched route
    pub params: HashMap<String, String>,
    /// Portion of the path consumed by a prefix-mounted route
    pub base_path: String,
}

impl MockRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            params: HashMap::new(),
            base_path: String::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Build from a hyper request whose body has already been collected.
    pub fn from_parts(parts: &hyper::http::request::Parts, body: Bytes) -> Self {
        Self {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers.clone(),
            body,
            params: HashMap::new(),
            base_path: String::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Request body parsed as JSON, if it is JSON.
    pub fn json_body(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// Path below the prefix the route is mounted on.
    pub fn relative_path(&self) -> &str {
        self.path
            .strip_prefix(self.base_path.as_str())
            .unwrap_or(&self.path)
    }
}

/// Response description used by static payloads and programmatic responders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockResponse {
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

fn default_status() -> u16 {
    200
}

impl Default for MockResponse {
    fn default() -> Self {
        Self {
            status: default_status(),
            headers: HashMap::new(),
            body: None,
        }
    }
}

impl MockResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Some(body),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// String bodies are sent as-is, any other JSON value is serialized
    /// and gets an `application/json` content type unless one is set.
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let builder = ResponseBuilder::from_u16(self.status).merge_headers(
            self.headers
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );
        match self.body {
            None => builder.build_full(),
            Some(serde_json::Value::String(text)) => builder.body(text).build_full(),
            Some(value) => builder
                .default_header("content-type", "application/json")
                .body(serde_json::to_vec(&value).unwrap_or_default())
                .build_full(),
        }
    }
}
