//! Mock definitions and runtime settings.

use crate::mocks::DelayProvider;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MocksConfig {
    /// Folder holding `routes/` and `collections.*`
    #[serde(default = "default_path")]
    pub path: PathBuf,
    /// Collection selected on startup (first declared when omitted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    /// Global response delay in milliseconds
    #[serde(default)]
    pub delay: i64,
    /// Reload definitions when files change
    #[serde(default = "default_watch")]
    pub watch: bool,
    #[serde(default = "default_debounce_ms")]
    pub watch_debounce_ms: u64,
}

impl Default for MocksConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            collection: None,
            delay: 0,
            watch: default_watch(),
            watch_debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_path() -> PathBuf {
    PathBuf::from("mocks")
}

fn default_watch() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    200
}

/// Global delay shared by the router (read on every request) and the admin
/// API (written at runtime).
#[derive(Debug, Clone, Default)]
pub struct GlobalDelay(Arc<AtomicI64>);

impl GlobalDelay {
    pub fn new(ms: i64) -> Self {
        Self(Arc::new(AtomicI64::new(ms)))
    }

    pub fn get(&self) -> i64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, ms: i64) {
        self.0.store(ms, Ordering::Relaxed);
    }

    /// Live reader for [`CompiledRouter`](crate::mocks::CompiledRouter).
    pub fn provider(&self) -> DelayProvider {
        let delay = Arc::clone(&self.0);
        Arc::new(move || delay.load(Ordering::Relaxed))
    }
}
