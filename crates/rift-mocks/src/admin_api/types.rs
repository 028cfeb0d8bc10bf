//! Admin API request/response bodies and shared state.

use crate::alerts::Alerts;
use crate::config::GlobalDelay;
use crate::files::FileLoader;
use crate::mocks::Mocks;
use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::Request;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Everything the admin endpoints operate on.
#[derive(Clone)]
pub struct AdminState {
    pub mocks: Arc<Mocks>,
    pub alerts: Arc<Alerts>,
    pub delay: GlobalDelay,
    /// Present when definitions come from a mocks folder
    pub loader: Option<Arc<FileLoader>>,
}

impl AdminState {
    pub fn new(mocks: Arc<Mocks>, alerts: Arc<Alerts>, delay: GlobalDelay) -> Self {
        Self {
            mocks,
            alerts,
            delay,
            loader: None,
        }
    }

    pub fn with_loader(mut self, loader: Arc<FileLoader>) -> Self {
        self.loader = Some(loader);
        self
    }
}

#[derive(Debug, Serialize)]
pub struct AboutResponse {
    pub name: &'static str,
    pub version: &'static str,
}

/// `GET|PUT /admin/collections/current`
#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentCollection {
    pub id: Option<String>,
}

/// `POST /admin/custom-route-variants`: one id or several
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum UseVariantsRequest {
    One { id: String },
    Many { ids: Vec<String> },
}

impl UseVariantsRequest {
    pub fn into_ids(self) -> Vec<String> {
        match self {
            UseVariantsRequest::One { id } => vec![id],
            UseVariantsRequest::Many { ids } => ids,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub delay: i64,
    pub collection: Option<String>,
}

/// `PATCH /admin/settings`; absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsPatch {
    #[serde(default)]
    pub delay: Option<i64>,
    #[serde(default)]
    pub collection: Option<String>,
}

/// Collect request body to bytes
pub async fn collect_body(req: Request<Incoming>) -> Result<Bytes, String> {
    req.into_body()
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| format!("Failed to read body: {e}"))
}
