//! # Windowed Store
//!
//! Entries keyed by (key, time window), held in an ordered map keyed by
//! (window start, key) so range scans and eviction walk windows oldest-first.
//! Expiry is retention-based: once a window's end plus the retention horizon
//! passes, the owning stage's maintenance tick removes its entries.

use parking_lot::RwLock;
use shared_types::TimeWindow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Composite identity of one windowed entry.
///
/// Rendered as `key@window_start` on the state-query surface so windowed
/// entries can be addressed by a flat string key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowedKey {
    /// The logical key (transaction id, aggregate name).
    pub key: String,
    /// The window the entry belongs to.
    pub window: TimeWindow,
}

impl fmt::Display for WindowedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.key, self.window.start_ms)
    }
}

/// The logical key half of a composite `key@window_start` string.
///
/// Plain keys pass through unchanged, so routing works uniformly for keyed
/// and windowed stores.
#[must_use]
pub fn logical_key(composite: &str) -> &str {
    composite.rsplit_once('@').map_or(composite, |(key, _)| key)
}

impl FromStr for WindowedKey {
    type Err = ();

    /// Parse `key@window_start`. The window end is unknown to the caller;
    /// lookups resolve it against the store's own entry.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, start) = s.rsplit_once('@').ok_or(())?;
        let start_ms: i64 = start.parse().map_err(|_| ())?;
        Ok(WindowedKey {
            key: key.to_string(),
            window: TimeWindow {
                start_ms,
                end_ms: start_ms,
            },
        })
    }
}

struct WindowedEntry<V> {
    window: TimeWindow,
    value: V,
}

type EntryMap<V> = BTreeMap<(i64, String), WindowedEntry<V>>;

/// Mutation handle over a windowed store. Held only by the owning stage.
pub struct WindowedStore<V> {
    inner: Arc<RwLock<EntryMap<V>>>,
    window_size_ms: i64,
    retention_ms: i64,
}

impl<V: Clone + Send + Sync> WindowedStore<V> {
    /// Create an empty store with the given window size and retention.
    #[must_use]
    pub fn new(window_size_ms: i64, retention_ms: i64) -> Self {
        Self {
            inner: Arc::new(RwLock::new(BTreeMap::new())),
            window_size_ms: window_size_ms.max(1),
            retention_ms: retention_ms.max(0),
        }
    }

    /// The window an event timestamp falls into.
    #[must_use]
    pub fn window_for(&self, timestamp_ms: i64) -> TimeWindow {
        TimeWindow::containing(timestamp_ms, self.window_size_ms)
    }

    /// Point lookup for (key, window).
    #[must_use]
    pub fn get(&self, key: &str, window: TimeWindow) -> Option<V> {
        self.inner
            .read()
            .get(&(window.start_ms, key.to_string()))
            .map(|e| e.value.clone())
    }

    /// Fetch-or-create-then-modify the entry for (key, window).
    ///
    /// The closure receives the current value (`None` on first touch) and
    /// returns the value to persist. Runs under the write lock, so the
    /// read-modify-write is atomic with respect to concurrent readers.
    pub fn update<F>(&self, key: &str, window: TimeWindow, f: F)
    where
        F: FnOnce(Option<&V>) -> V,
    {
        let mut map = self.inner.write();
        let slot = (window.start_ms, key.to_string());
        let next = f(map.get(&slot).map(|e| &e.value));
        map.insert(slot, WindowedEntry {
            window,
            value: next,
        });
    }

    /// Snapshot of every entry, oldest window first.
    #[must_use]
    pub fn entries(&self) -> Vec<(WindowedKey, V)> {
        self.inner
            .read()
            .iter()
            .map(|((_, key), e)| {
                (
                    WindowedKey {
                        key: key.clone(),
                        window: e.window,
                    },
                    e.value.clone(),
                )
            })
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

    /// Remove entries whose window ended more than the retention horizon
    /// before `now_ms`. Returns how many were evicted.
    pub fn evict_expired(&self, now_ms: i64) -> usize {
        let cutoff = now_ms - self.retention_ms;
        let mut map = self.inner.write();
        let before = map.len();
        map.retain(|_, e| e.window.end_ms >= cutoff);
        let evicted = before - map.len();
        if evicted > 0 {
            debug!(evicted, cutoff, "expired windowed entries evicted");
        }
        evicted
    }

    /// A read-only handle safe to hand to concurrent readers.
    #[must_use]
    pub fn read_handle(&self) -> WindowedReadHandle<V> {
        WindowedReadHandle {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Read-only view over a [`WindowedStore`].
pub struct WindowedReadHandle<V> {
    inner: Arc<RwLock<EntryMap<V>>>,
}

impl<V> Clone for WindowedReadHandle<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Clone + Send + Sync> WindowedReadHandle<V> {
    /// Point lookup for (key, window start).
    #[must_use]
    pub fn get(&self, key: &str, window_start_ms: i64) -> Option<V> {
        self.inner
            .read()
            .get(&(window_start_ms, key.to_string()))
            .map(|e| e.value.clone())
    }

    /// Snapshot of every entry, oldest window first.
    #[must_use]
    pub fn entries(&self) -> Vec<(WindowedKey, V)> {
        self.inner
            .read()
            .iter()
            .map(|((_, key), e)| {
                (
                    WindowedKey {
                        key: key.clone(),
                        window: e.window,
                    },
                    e.value.clone(),
                )
            })
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
