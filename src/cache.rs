//! Singleton instance cache.

use crate::key::Key;
use crate::registration::{AnyArc, FastMap};

/// Completed singleton services, keyed by contract.
///
/// Entries are only ever added by a top-level resolution that finished
/// without error, and are never replaced or removed afterwards.
pub(crate) struct InstanceCache {
    entries: FastMap<Key, AnyArc>,
}

impl InstanceCache {
    pub(crate) fn new() -> Self {
        Self { entries: FastMap::default() }
    }

    #[inline]
    pub(crate) fn get(&self, key: &Key) -> Option<AnyArc> {
        self.entries.get(key).cloned()
    }

    /// Stores a completed singleton. An existing entry is kept.
    pub(crate) fn put(&mut self, key: Key, service: AnyArc) {
        self.entries.entry(key).or_insert(service);
    }

    #[inline]
    pub(crate) fn contains(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
