//! # Queryable Store Adaptation
//!
//! The state-query endpoint serves any registered store uniformly: point
//! lookup by flat string key, key enumeration, entry enumeration, row count.
//! Values cross the wire as JSON, so any store whose value type serializes
//! can be registered.

use crate::keyed::KeyedReadHandle;
use crate::windowed::{WindowedKey, WindowedReadHandle};
use serde::Serialize;

/// A store servable over the state query endpoint.
///
/// Implementations are read-only views; the query layer never mutates.
pub trait QueryableStore: Send + Sync {
    /// Point lookup by flat key (`key@window_start` for windowed stores).
    fn get(&self, key: &str) -> Option<serde_json::Value>;

    /// Every flat key in the local partition.
    fn keys(&self) -> Vec<String>;

    /// Every (flat key, value) pair in the local partition.
    fn entries(&self) -> Vec<(String, serde_json::Value)>;

    /// Local row count.
    fn len(&self) -> usize;
}

impl<V> QueryableStore for KeyedReadHandle<V>
where
    V: Clone + Serialize + Send + Sync,
{
    fn get(&self, key: &str) -> Option<serde_json::Value> {
        KeyedReadHandle::get(self, key).and_then(|v| serde_json::to_value(v).ok())
    }

    fn keys(&self) -> Vec<String> {
        self.entries().into_iter().map(|(k, _)| k).collect()
    }

    fn entries(&self) -> Vec<(String, serde_json::Value)> {
        KeyedReadHandle::entries(self)
            .into_iter()
            .filter_map(|(k, v)| serde_json::to_value(v).ok().map(|v| (k, v)))
            .collect()
    }

    fn len(&self) -> usize {
        KeyedReadHandle::len(self)
    }
}

impl<V> QueryableStore for WindowedReadHandle<V>
where
    V: Clone + Serialize + Send + Sync,
{
    fn get(&self, key: &str) -> Option<serde_json::Value> {
        let parsed: WindowedKey = key.parse().ok()?;
        WindowedReadHandle::get(self, &parsed.key, parsed.window.start_ms)
            .and_then(|v| serde_json::to_value(v).ok())
    }

    fn keys(&self) -> Vec<String> {
        WindowedReadHandle::entries(self)
            .into_iter()
            .map(|(k, _)| k.to_string())
            .collect()
    }

    fn entries(&self) -> Vec<(String, serde_json::Value)> {
        WindowedReadHandle::entries(self)
            .into_iter()
            .filter_map(|(k, v)| serde_json::to_value(v).ok().map(|v| (k.to_string(), v)))
            .collect()
    }

    fn len(&self) -> usize {
        WindowedReadHandle::len(self)
    }
}
