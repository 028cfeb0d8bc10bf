//! Router compilation and dispatch.
//!
//! A [`CompiledRouter`] is an immutable, ordered list of `(method, url)`
//! entries built from a resolved variant list. Dispatch walks the entries in
//! registration order: the first entry whose method and url match runs its
//! delay step, then its handler; a handler answering [`Outcome::Next`] hands
//! the request to the next matching entry.

use super::index::RouteVariant;
use crate::definitions::{UrlPattern, ANY_VERB};
use crate::handlers::{MockRequest, Outcome};
use hyper::Method;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Live read of the global default delay in milliseconds.
pub type DelayProvider = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Delay provider returning a constant.
pub fn fixed_delay(ms: i64) -> DelayProvider {
    Arc::new(move || ms)
}

struct RouterEntry {
    /// `None` matches every method
    method: Option<Method>,
    variant: Arc<RouteVariant>,
}

/// Two different routes registered for the same method and url.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateEntry {
    pub method: String,
    pub url: String,
    /// Route that wins at dispatch time
    pub first: String,
    /// Route shadowed by `first`
    pub shadowed: String,
}

impl fmt::Display for DuplicateEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Routes '{}' and '{}' are both registered for {} {}; '{}' takes precedence",
            self.first,
            self.shadowed,
            self.method.to_uppercase(),
            self.url,
            self.first
        )
    }
}

/// Dispatchable router for one resolved variant list.
pub struct CompiledRouter {
    entries: Vec<RouterEntry>,
    delay: DelayProvider,
}

impl fmt::Debug for CompiledRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRouter")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl CompiledRouter {
    /// Router that passes every request through.
    pub fn empty(delay: DelayProvider) -> Self {
        Self {
            entries: Vec::new(),
            delay,
        }
    }

    /// Register one entry per method of every variant, in list order.
    ///
    /// Overlapping entries coming from different routes are kept (first
    /// registered wins at dispatch) and reported. Two entries overlap when
    /// their urls are equal ignoring case and a trailing slash, and their
    /// methods are equal or one of them is `*`.
    pub fn compile(
        variants: &[Arc<RouteVariant>],
        delay: DelayProvider,
    ) -> (Self, Vec<DuplicateEntry>) {
        let mut entries: Vec<RouterEntry> = Vec::new();
        let mut duplicates: Vec<DuplicateEntry> = Vec::new();

        for variant in variants {
            let methods: Vec<Option<Method>> = match &variant.methods {
                None => vec![None],
                Some(methods) => methods.iter().cloned().map(Some).collect(),
            };
            let key = url_key(&variant.url);
            for method in methods {
                let shadowing = entries.iter().find(|entry| {
                    entry.variant.route_id != variant.route_id
                        && methods_overlap(&entry.method, &method)
                        && url_key(&entry.variant.url) == key
                });
                if let Some(first) = shadowing {
                    let duplicate = DuplicateEntry {
                        method: method_label(method.as_ref().or(first.method.as_ref())),
                        url: key.clone(),
                        first: first.variant.route_id.clone(),
                        shadowed: variant.route_id.clone(),
                    };
                    if !duplicates.contains(&duplicate) {
                        duplicates.push(duplicate);
                    }
                }
                entries.push(RouterEntry {
                    method,
                    variant: Arc::clone(variant),
                });
            }
        }

        (Self { entries, delay }, duplicates)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Route variants served by this router, in registration order.
    pub fn variant_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for entry in &self.entries {
            if !ids.contains(&entry.variant.id) {
                ids.push(entry.variant.id.clone());
            }
        }
        ids
    }

    /// Handle a request; [`Outcome::Next`] when no route answered it.
    pub async fn dispatch(&self, mut request: MockRequest) -> Outcome {
        for entry in &self.entries {
            if let Some(method) = &entry.method {
                if *method != request.method {
                    continue;
                }
            }
            let Some(matched) = entry.variant.matches_path(&request.path) else {
                continue;
            };

            trace!(
                "{} {} matched route variant '{}'",
                request.method,
                request.path,
                entry.variant.id
            );
            request.params = matched.params;
            request.base_path = matched.base_path;

            let delay = entry.variant.effective_delay(|| (self.delay)());
            if delay > 0 {
                debug!("Delaying '{}' by {}ms", entry.variant.id, delay);
                tokio::time::sleep(Duration::from_millis(delay as u64)).await;
            }

            match entry.variant.handler().handle(&request).await {
                Outcome::Respond(response) => return Outcome::Respond(response),
                Outcome::Next => continue,
            }
        }
        Outcome::Next
    }
}

fn methods_overlap(a: &Option<Method>, b: &Option<Method>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

fn method_label(method: Option<&Method>) -> String {
    method
        .map(|m| m.as_str().to_lowercase())
        .unwrap_or_else(|| ANY_VERB.to_string())
}

/// Url as dispatch sees it: paths ignore case and a trailing slash.
fn url_key(url: &UrlPattern) -> String {
    match url {
        UrlPattern::Path(path) => {
            let trimmed = path.trim_end_matches('/');
            if trimmed.is_empty() {
                "/".to_string()
            } else {
                trimmed.to_lowercase()
            }
        }
        UrlPattern::Regex { regex } => regex.clone(),
    }
}
