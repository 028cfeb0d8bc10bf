//! Mocks - holder of the live router.
//!
//! `Mocks` owns the definitions of the last load, the selected collection and
//! the runtime overrides. Every state change resolves the selection again,
//! compiles a fresh [`CompiledRouter`] and publishes it atomically; requests
//! already dispatching keep the router they started with.

use super::index::{DefinitionIndex, PlainRoute, PlainVariant};
use super::overrides::OverrideSet;
use super::resolver::{resolve, ResolveError};
use super::router::{CompiledRouter, DelayProvider};
use super::types::{ChangeListener, ListenerId, MocksError, PlainCollection};
use crate::alerts::AlertSink;
use crate::definitions::{
    validate_collections, validate_routes, CollectionDefinition, RouteDefinition, ValidationError,
};
use crate::handlers::{HandlerRegistry, MockRequest, Outcome};
use arc_swap::ArcSwap;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Default)]
struct MocksState {
    index: Arc<DefinitionIndex>,
    loaded: bool,
    /// Collection asked for by configuration or `set_current`
    selected: Option<String>,
    /// Collection actually resolved
    current: Option<String>,
    overrides: OverrideSet,
    /// Alerts raised by the last rebuild, removed by the next one
    rebuild_alerts: Vec<String>,
}

/// Live router holder.
pub struct Mocks {
    registry: HandlerRegistry,
    alerts: Arc<dyn AlertSink>,
    delay: DelayProvider,
    state: Mutex<MocksState>,
    router: ArcSwap<CompiledRouter>,
    listeners: RwLock<Vec<(ListenerId, ChangeListener)>>,
    next_listener: AtomicU64,
}

impl Mocks {
    /// Holder with the built-in handler kinds. Serves nothing until loaded.
    pub fn new(alerts: Arc<dyn AlertSink>, delay: DelayProvider) -> Self {
        Self::with_registry(HandlerRegistry::with_defaults(), alerts, delay)
    }

    pub fn with_registry(
        registry: HandlerRegistry,
        alerts: Arc<dyn AlertSink>,
        delay: DelayProvider,
    ) -> Self {
        Self {
            registry,
            alerts,
            router: ArcSwap::from_pointee(CompiledRouter::empty(Arc::clone(&delay))),
            delay,
            state: Mutex::new(MocksState::default()),
            listeners: RwLock::new(Vec::new()),
            next_listener: AtomicU64::new(0),
        }
    }

    /// Collection to select on the first load.
    pub fn with_selected(self, collection_id: impl Into<String>) -> Self {
        self.state.lock().selected = Some(collection_id.into());
        self
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Replace the definitions, reselect the collection and publish a new
    /// router.
    ///
    /// Invalid definitions are dropped and reported; runtime overrides are
    /// kept and applied to the new definitions.
    pub fn load(&self, routes: Vec<RouteDefinition>, collections: Vec<CollectionDefinition>) {
        let mut state = self.state.lock();
        self.alerts.clean();
        state.rebuild_alerts.clear();

        let mut critical = 0;

        let routes = validate_routes(routes, &self.registry);
        for (label, errors) in &routes.invalid {
            self.alerts.set(
                &format!("validation:routes:{label}"),
                &format!("Route '{label}' is invalid and was ignored"),
                Some(&join_errors(errors)),
            );
        }
        critical += routes.error_count();

        let collections = validate_collections(collections);
        for (label, errors) in &collections.invalid {
            self.alerts.set(
                &format!("validation:collections:{label}"),
                &format!("Collection '{label}' is invalid and was ignored"),
                Some(&join_errors(errors)),
            );
        }
        critical += collections.error_count();

        let (index, index_errors) =
            DefinitionIndex::build(&routes.valid, collections.valid, &self.registry);
        for error in &index_errors {
            self.alerts.set(
                &format!("validation:variants:{}", error.subject()),
                &error.to_string(),
                None,
            );
        }
        critical += index_errors.len();

        // Reference problems of every collection, not only the selected one
        let mut reported = BTreeSet::new();
        for id in index.collection_ids() {
            for error in resolve(&id, &index, &OverrideSet::new()).errors {
                let alert_id = error.alert_id();
                if reported.insert(alert_id.clone()) {
                    self.alerts.set(&alert_id, &error.to_string(), None);
                }
            }
        }
        critical += reported.len();

        if critical > 0 {
            self.alerts.set(
                "critical-error",
                &format!("Critical errors found while loading mocks: {critical}"),
                None,
            );
        }

        info!(
            "Loaded {} routes, {} route variants and {} collections",
            index.routes().len(),
            index.variants().len(),
            index.collections().len()
        );

        state.index = Arc::new(index);
        state.loaded = true;
        state.current = self.pick_collection(&state);
        self.rebuild(&mut state);
        drop(state);
        self.notify();
    }

    fn pick_collection(&self, state: &MocksState) -> Option<String> {
        let ids = state.index.collection_ids();
        let Some(first) = ids.first() else {
            self.alerts.set("empty", "No collections found", None);
            return None;
        };
        match state.selected.as_deref() {
            Some(id) if state.index.collection(id).is_some() => Some(id.to_string()),
            Some(id) => {
                self.alerts.set(
                    "settings",
                    &format!("Collection '{id}' was not found. Using the first one found: '{first}'"),
                    None,
                );
                Some(first.clone())
            }
            None => {
                self.alerts.set(
                    "settings",
                    &format!(
                        "Option 'collection' was not defined. Using the first collection found: '{first}'"
                    ),
                    None,
                );
                Some(first.clone())
            }
        }
    }

    /// Select the active collection.
    ///
    /// Before the first load the id is only remembered. Afterwards an unknown
    /// id is reported and the current selection stays as it is.
    pub fn set_current(&self, collection_id: &str) -> Result<(), MocksError> {
        let mut state = self.state.lock();
        if !state.loaded {
            debug!("Collection '{}' will be selected on load", collection_id);
            state.selected = Some(collection_id.to_string());
            return Ok(());
        }
        if state.index.collection(collection_id).is_none() {
            self.alerts.set(
                "settings",
                &format!("Collection '{collection_id}' was not found"),
                None,
            );
            return Err(MocksError::CollectionNotFound(collection_id.to_string()));
        }

        self.alerts.remove("settings");
        state.selected = Some(collection_id.to_string());
        state.current = Some(collection_id.to_string());
        self.rebuild(&mut state);
        drop(state);
        self.notify();
        Ok(())
    }

    /// Force one route variant on top of the current collection.
    pub fn use_route_variant(&self, variant_id: &str) -> Result<(), MocksError> {
        self.use_route_variants([variant_id])
    }

    /// Force several route variants. Either all of them are applied or, when
    /// one is unknown, none is.
    pub fn use_route_variants<I, S>(&self, variant_ids: I) -> Result<(), MocksError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let variant_ids: Vec<String> = variant_ids
            .into_iter()
            .map(|id| id.as_ref().to_string())
            .collect();

        let mut state = self.state.lock();
        if let Some(missing) = variant_ids
            .iter()
            .find(|id| state.index.variant(id).is_none())
        {
            self.alerts.set(
                "override",
                &format!("Route variant '{missing}' was not found"),
                None,
            );
            return Err(MocksError::VariantNotFound(missing.clone()));
        }

        self.alerts.remove("override");
        for id in &variant_ids {
            state.overrides.insert(id);
        }
        info!("Using custom route variants: {:?}", variant_ids);
        self.rebuild(&mut state);
        drop(state);
        self.notify();
        Ok(())
    }

    /// Drop every override, back to the plain collection.
    pub fn restore_route_variants(&self) {
        let mut state = self.state.lock();
        state.overrides.clear();
        self.alerts.remove("override");
        info!("Custom route variants restored");
        self.rebuild(&mut state);
        drop(state);
        self.notify();
    }

    fn rebuild(&self, state: &mut MocksState) {
        for id in state.rebuild_alerts.drain(..) {
            self.alerts.remove(&id);
        }

        let variants = match state.current.as_deref() {
            Some(collection_id) => {
                let resolution = resolve(collection_id, &state.index, &state.overrides);
                for error in &resolution.errors {
                    // Collection problems were reported at load
                    if let ResolveError::OverrideNotFound(_) = error {
                        let id = error.alert_id();
                        self.alerts.set(&id, &error.to_string(), None);
                        state.rebuild_alerts.push(id);
                    }
                }
                resolution.variants
            }
            None => Vec::new(),
        };

        let (router, duplicates) = CompiledRouter::compile(&variants, Arc::clone(&self.delay));
        for duplicate in &duplicates {
            let id = format!("router:duplicated:{}:{}", duplicate.method, duplicate.url);
            self.alerts.set(&id, &duplicate.to_string(), None);
            state.rebuild_alerts.push(id);
        }

        info!(
            "Collection '{}' active with {} route variants",
            state.current.as_deref().unwrap_or("-"),
            variants.len()
        );
        self.router.store(Arc::new(router));
    }

    /// Register a callback fired after every router change.
    pub fn on_change<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    /// Returns `false` when the listener was already removed.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    fn notify(&self) {
        let listeners: Vec<ChangeListener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener();
        }
    }

    /// Router currently published.
    pub fn router(&self) -> Arc<CompiledRouter> {
        self.router.load_full()
    }

    /// Dispatch a request through the router current at call time.
    pub async fn dispatch(&self, request: MockRequest) -> Outcome {
        let router = self.router();
        router.dispatch(request).await
    }

    /// Id of the active collection.
    pub fn current(&self) -> Option<String> {
        self.state.lock().current.clone()
    }

    /// Collection ids in declaration order.
    pub fn ids(&self) -> Vec<String> {
        self.state.lock().index.collection_ids()
    }

    /// Route variant ids forced at runtime.
    pub fn custom_route_variants(&self) -> Vec<String> {
        self.state.lock().overrides.variant_ids()
    }

    /// Route variant ids the published router serves, in dispatch order.
    pub fn current_route_variants(&self) -> Vec<String> {
        self.router().variant_ids()
    }

    pub fn plain_routes(&self) -> Vec<PlainRoute> {
        self.state.lock().index.routes().to_vec()
    }

    pub fn plain_variants(&self) -> Vec<PlainVariant> {
        let index = Arc::clone(&self.state.lock().index);
        index.variants().iter().map(|v| v.to_plain()).collect()
    }

    pub fn plain_collections(&self) -> Vec<PlainCollection> {
        self.state
            .lock()
            .index
            .collections()
            .iter()
            .map(|c| PlainCollection {
                id: c.id.clone().unwrap_or_default(),
                from: c.from.clone(),
                routes_variants: c.routes_variants.clone().unwrap_or_default(),
            })
            .collect()
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(". ")
}
