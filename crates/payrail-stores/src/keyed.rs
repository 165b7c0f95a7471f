//! # Keyed Store
//!
//! A key→value materialized map with point lookup and full scan. The account
//! ledger stage owns one; the query layer reads it concurrently.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Mutation handle over a keyed store. Held only by the owning stage.
pub struct KeyedStore<V> {
    inner: Arc<RwLock<HashMap<String, V>>>,
}

impl<V: Clone + Send + Sync> KeyedStore<V> {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert or replace the value for a key.
    pub fn put(&self, key: impl Into<String>, value: V) {
        self.inner.write().insert(key.into(), value);
    }

    /// Point lookup.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.read().get(key).cloned()
    }

    /// Snapshot of every entry. Readers never hold the lock during iteration.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, V)> {
        self.inner
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Row count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// A read-only handle safe to hand to concurrent readers.
    #[must_use]
    pub fn read_handle(&self) -> KeyedReadHandle<V> {
        KeyedReadHandle {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Clone + Send + Sync> Default for KeyedStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view over a [`KeyedStore`].
pub struct KeyedReadHandle<V> {
    inner: Arc<RwLock<HashMap<String, V>>>,
}

impl<V> Clone for KeyedReadHandle<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Clone + Send + Sync> KeyedReadHandle<V> {
    /// Point lookup.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.read().get(key).cloned()
    }

    /// Snapshot of every entry.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, V)> {
        self.inner
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Row count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get() {
        let store = KeyedStore::new();
        store.put("neil", 10i64);
        assert_eq!(store.get("neil"), Some(10));
        assert_eq!(store.get("john"), None);
    }

    #[test]
    fn test_put_replaces() {
        let store = KeyedStore::new();
        store.put("neil", 10i64);
        store.put("neil", -5i64);
        assert_eq!(store.get("neil"), Some(-5));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_read_handle_sees_writes() {
        let store = KeyedStore::new();
        let reader = store.read_handle();
        assert!(reader.is_empty());

        store.put("john", 42i64);
        assert_eq!(reader.get("john"), Some(42));
        assert_eq!(reader.len(), 1);
    }

    #[test]
    fn test_entries_snapshot() {
        let store = KeyedStore::new();
        store.put("a", 1i64);
        store.put("b", 2i64);

        let mut entries = store.entries();
        entries.sort();
        assert_eq!(entries, vec![("a".to_string(), 1), ("b".to_string(), 2)]);
    }
}
