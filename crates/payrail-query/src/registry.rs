//! # Store Registry
//!
//! The locally hosted stores one instance serves over its query endpoint,
//! addressed by public store name. The registry holds read-only views; the
//! query layer never mutates store state.

use parking_lot::RwLock;
use payrail_stores::QueryableStore;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of locally hosted stores, by name.
#[derive(Default)]
pub struct StoreRegistry {
    stores: Arc<RwLock<HashMap<String, Arc<dyn QueryableStore>>>>,
}

impl Clone for StoreRegistry {
    fn clone(&self) -> Self {
        Self {
            stores: Arc::clone(&self.stores),
        }
    }
}

impl StoreRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a store's read-only view under a public name.
    pub fn register(&self, name: impl Into<String>, store: Arc<dyn QueryableStore>) {
        self.stores.write().insert(name.into(), store);
    }

    /// Look up a registered store.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn QueryableStore>> {
        self.stores.read().get(name).cloned()
    }

    /// Names of every registered store.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.stores.read().keys().cloned().collect()
    }
}
