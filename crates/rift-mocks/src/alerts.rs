//! Operator-visible alerts.
//!
//! The engine reports every validation and resolution problem here under a
//! structured id (`settings`, `empty`, `critical-error`, `validation:routes:<id>`
//! ...). Setting an alert with an existing id replaces it, so a problem that is
//! reported again on every reload shows up once.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, warn};

/// A single alert.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Capability the engine uses to publish alerts.
pub trait AlertSink: Send + Sync {
    fn set(&self, id: &str, message: &str, error: Option<&str>);
    fn remove(&self, id: &str);
    fn clean(&self);
}

/// In-memory alert store, mirrored to `tracing`.
#[derive(Debug, Default)]
pub struct Alerts {
    alerts: RwLock<BTreeMap<String, Alert>>,
}

impl Alerts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every alert whose id starts with `prefix`.
    pub fn clean_prefix(&self, prefix: &str) {
        self.alerts.write().retain(|id, _| !id.starts_with(prefix));
    }

    /// View of this store whose ids are prefixed with `scope:`.
    ///
    /// `clean` on the view only removes alerts of that scope.
    pub fn scoped(self: &Arc<Self>, scope: &str) -> ScopedAlerts {
        ScopedAlerts {
            store: Arc::clone(self),
            prefix: format!("{scope}:"),
        }
    }

    pub fn get(&self, id: &str) -> Option<Alert> {
        self.alerts.read().get(id).cloned()
    }

    /// All alerts, sorted by id.
    pub fn list(&self) -> Vec<Alert> {
        self.alerts.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.alerts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.read().is_empty()
    }
}

impl AlertSink for Alerts {
    fn set(&self, id: &str, message: &str, error: Option<&str>) {
        match error {
            Some(err) => error!(alert = id, "{}: {}", message, err),
            None => warn!(alert = id, "{}", message),
        }
        self.alerts.write().insert(
            id.to_string(),
            Alert {
                id: id.to_string(),
                message: message.to_string(),
                error: error.map(str::to_string),
                created_at: Utc::now(),
            },
        );
    }

    fn remove(&self, id: &str) {
        self.alerts.write().remove(id);
    }

    fn clean(&self) {
        self.alerts.write().clear();
    }
}

/// Alerts of one scope inside a shared [`Alerts`] store.
#[derive(Debug, Clone)]
pub struct ScopedAlerts {
    store: Arc<Alerts>,
    prefix: String,
}

impl AlertSink for ScopedAlerts {
    fn set(&self, id: &str, message: &str, error: Option<&str>) {
        self.store.set(&format!("{}{id}", self.prefix), message, error);
    }

    fn remove(&self, id: &str) {
        self.store.remove(&format!("{}{id}", self.prefix));
    }

    fn clean(&self) {
        self.store.clean_prefix(&self.prefix);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_same_id() {
        let alerts = Alerts::new();
        alerts.set("settings", "first", None);
        alerts.set("settings", "second", Some("boom"));
        assert_eq!(alerts.len(), 1);
        let alert = alerts.get("settings").unwrap();
        assert_eq!(alert.message, "second");
        assert_eq!(alert.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_remove_and_clean() {
        let alerts = Alerts::new();
        alerts.set("validation:routes:a", "bad", None);
        alerts.set("validation:routes:b", "bad", None);
        alerts.set("empty", "none", None);

        alerts.clean_prefix("validation:");
        assert_eq!(alerts.list().len(), 1);

        alerts.remove("empty");
        assert!(alerts.is_empty());

        alerts.set("x", "y", None);
        alerts.clean();
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_scoped_clean_keeps_other_scopes() {
        let alerts = Arc::new(Alerts::new());
        let mocks = alerts.scoped("mocks");
        let files = alerts.scoped("files");
        mocks.set("empty", "No collections found", None);
        files.set("routes.json", "Error parsing file", Some("EOF"));

        assert!(alerts.get("mocks:empty").is_some());
        mocks.clean();
        assert!(alerts.get("mocks:empty").is_none());
        assert!(alerts.get("files:routes.json").is_some());

        files.remove("routes.json");
        assert!(alerts.is_empty());
    }
}
