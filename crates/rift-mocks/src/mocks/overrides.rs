//! Runtime route variant overrides.

use crate::definitions::split_variant_key;

/// Forced variant per route, in the order the routes were first overridden.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideSet {
    entries: Vec<(String, String)>,
}

impl OverrideSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force `routeId:variantId`, replacing any previous choice for that route.
    ///
    /// Returns `false` when the id is not a composite variant id.
    pub fn insert(&mut self, variant_id: &str) -> bool {
        let Some((route_id, _)) = split_variant_key(variant_id) else {
            return false;
        };
        match self.entries.iter_mut().find(|(route, _)| route == route_id) {
            Some(entry) => entry.1 = variant_id.to_string(),
            None => self
                .entries
                .push((route_id.to_string(), variant_id.to_string())),
        }
        true
    }

    /// Forced variant id for a route.
    pub fn get(&self, route_id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(route, _)| route == route_id)
            .map(|(_, variant)| variant.as_str())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(routeId, variantId)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(route, variant)| (route.as_str(), variant.as_str()))
    }

    /// Forced composite variant ids, for display.
    pub fn variant_ids(&self) -> Vec<String> {
        self.entries.iter().map(|(_, v)| v.clone()).collect()
    }
}
