// ── Per-key store registry ──
//
// Guarantees a single shared container per resource key. Containers are
// created lazily on first reference and are never replaced, so a second
// caller never wipes a key's in-flight state.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tracing::trace;

use super::entry::KeyEntry;
use crate::key::ResourceKey;

/// Concurrent map from resource key to its container.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    entries: DashMap<ResourceKey, Arc<KeyEntry>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Return the container for `key`, creating it with `default` data and
    /// an initial `loading` of `auto` if it does not exist yet.
    pub(crate) fn get_or_create(
        &self,
        key: &ResourceKey,
        default: Option<Value>,
        auto: bool,
    ) -> Arc<KeyEntry> {
        if let Some(entry) = self.entries.get(key) {
            return Arc::clone(entry.value());
        }
        let entry = self.entries.entry(key.clone()).or_insert_with(|| {
            trace!(%key, "creating request container");
            Arc::new(KeyEntry::new(key.clone(), default, auto))
        });
        Arc::clone(entry.value())
    }

    pub(crate) fn get(&self, key: &ResourceKey) -> Option<Arc<KeyEntry>> {
        self.entries.get(key).map(|r| Arc::clone(r.value()))
    }

    /// All keys referenced so far.
    pub(crate) fn keys(&self) -> Vec<ResourceKey> {
        self.entries.iter().map(|r| r.key().clone()).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
