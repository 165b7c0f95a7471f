//! # State Query Federation Client
//!
//! A lightweight per-instance query coordinator with no central router: each
//! key resolves to its partition's owner via cluster metadata, local keys
//! read the in-process store, remote keys call the owner's endpoint, and
//! `key_set()`/`size()` scatter-gather across every live instance. Failures
//! degrade the affected key or instance to an unavailable marker - partial
//! completion is a reportable outcome, not an error.

use crate::error::QueryError;
use crate::metadata::{InstanceInfo, MetadataHandle};
use crate::registry::StoreRegistry;
use crate::wire::{CountResponse, ValueResponse};
use futures::future::join_all;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, warn};

/// Tuning knobs for the federation client.
#[derive(Debug, Clone)]
pub struct QueryClientConfig {
    /// Per remote call timeout; a slow instance never delays the batch past it.
    pub call_timeout: Duration,
    /// Retries while a key's partition has no owner (reassignment in flight).
    pub owner_retry_attempts: u32,
    /// Base backoff between ownership retries, scaled linearly per attempt.
    pub owner_retry_backoff: Duration,
}

impl Default for QueryClientConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(2),
            owner_retry_attempts: 3,
            owner_retry_backoff: Duration::from_millis(50),
        }
    }
}

/// Outcome of one key's lookup within a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyStatus {
    /// The owner served a value.
    Found(serde_json::Value),
    /// The owner is healthy but holds no value for the key.
    Absent,
    /// The key could not be resolved or its owner could not be reached.
    Unavailable {
        /// Why the key degraded.
        reason: String,
    },
}

/// Result of a batch `get`. Never partial-dropping: every requested key
/// appears exactly once, in request order.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    /// Per-key outcomes, in request order.
    pub rows: Vec<(String, KeyStatus)>,
}

impl BatchResult {
    /// No key degraded to unavailable.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self
            .rows
            .iter()
            .any(|(_, status)| matches!(status, KeyStatus::Unavailable { .. }))
    }

    /// The found value for a key, if any.
    #[must_use]
    pub fn value_of(&self, key: &str) -> Option<&serde_json::Value> {
        self.rows.iter().find_map(|(k, status)| match status {
            KeyStatus::Found(value) if k == key => Some(value),
            _ => None,
        })
    }
}

/// Result of a federated `key_set`.
#[derive(Debug, Clone, PartialEq)]
pub struct KeySetResult {
    /// Duplicate-free union of keys across reachable instances.
    pub keys: BTreeSet<String>,
    /// Instances whose contribution is unknown.
    pub unavailable_instances: Vec<String>,
}

impl KeySetResult {
    /// Every live instance contributed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unavailable_instances.is_empty()
    }
}

/// Result of a federated `size`.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeResult {
    /// Total rows across reachable instances.
    pub count: u64,
    /// Instances whose contribution is unknown.
    pub unavailable_instances: Vec<String>,
}

impl SizeResult {
    /// Every live instance contributed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unavailable_instances.is_empty()
    }
}

/// Federated read access to one named store across the cluster.
pub struct StateQueryClient {
    store_name: String,
    metadata: MetadataHandle,
    local_instance_id: String,
    registry: StoreRegistry,
    http: Option<reqwest::Client>,
    config: QueryClientConfig,
}

impl StateQueryClient {
    /// Construct with default tuning.
    #[must_use]
    pub fn new(
        store_name: impl Into<String>,
        metadata: MetadataHandle,
        local_instance_id: impl Into<String>,
        registry: StoreRegistry,
    ) -> Self {
        Self::with_config(
            store_name,
            metadata,
            local_instance_id,
            registry,
            QueryClientConfig::default(),
        )
    }

    /// Construct with explicit tuning.
    #[must_use]
    pub fn with_config(
        store_name: impl Into<String>,
        metadata: MetadataHandle,
        local_instance_id: impl Into<String>,
        registry: StoreRegistry,
        config: QueryClientConfig,
    ) -> Self {
        let http = match reqwest::Client::builder()
            .timeout(config.call_timeout)
            .build()
        {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(error = %e, "http client unavailable; remote reads will degrade");
                None
            }
        };
        Self {
            store_name: store_name.into(),
            metadata,
            local_instance_id: local_instance_id.into(),
            registry,
            http,
            config,
        }
    }

    /// The store this client reads.
    #[must_use]
    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    /// Release network resources. Further calls report the client stopped.
    pub fn stop(&mut self) {
        self.http = None;
        debug!(store = %self.store_name, "query client stopped");
    }

    /// Batch point lookup. Each key resolves independently; a dead owner
    /// degrades only that key.
    pub async fn get(&self, keys: &[String]) -> Result<BatchResult, QueryError> {
        self.ensure_running()?;
        let lookups = keys.iter().map(|key| self.lookup_key(key.clone()));
        Ok(BatchResult {
            rows: join_all(lookups).await,
        })
    }

    /// Duplicate-free union of the store's keys across all live instances.
    pub async fn key_set(&self) -> Result<KeySetResult, QueryError> {
        self.ensure_running()?;
        let instances = self.metadata.snapshot().instances();
        let fetches = instances.iter().map(|instance| self.instance_keys(instance));
        let results = join_all(fetches).await;

        let mut keys = BTreeSet::new();
        let mut unavailable_instances = Vec::new();
        for (instance, result) in instances.iter().zip(results) {
            match result {
                Ok(instance_keys) => keys.extend(instance_keys),
                Err(e) => {
                    warn!(instance = %instance.instance_id, error = %e, "instance key set unavailable");
                    unavailable_instances.push(instance.instance_id.clone());
                }
            }
        }
        Ok(KeySetResult {
            keys,
            unavailable_instances,
        })
    }

    /// Total row count across all live instances.
    pub async fn size(&self) -> Result<SizeResult, QueryError> {
        self.ensure_running()?;
        let instances = self.metadata.snapshot().instances();
        let fetches = instances.iter().map(|instance| self.instance_count(instance));
        let results = join_all(fetches).await;

        let mut count = 0u64;
        let mut unavailable_instances = Vec::new();
        for (instance, result) in instances.iter().zip(results) {
            match result {
                Ok(instance_count) => count += instance_count,
                Err(e) => {
                    warn!(instance = %instance.instance_id, error = %e, "instance count unavailable");
                    unavailable_instances.push(instance.instance_id.clone());
                }
            }
        }
        Ok(SizeResult {
            count,
            unavailable_instances,
        })
    }

    fn ensure_running(&self) -> Result<(), QueryError> {
        if self.http.is_none() {
            return Err(QueryError::ClientStopped);
        }
        Ok(())
    }

    async fn lookup_key(&self, key: String) -> (String, KeyStatus) {
        let Some(owner) = self.resolve_owner(&key).await else {
            return (
                key,
                KeyStatus::Unavailable {
                    reason: "no partition owner".to_string(),
                },
            );
        };

        if owner.instance_id == self.local_instance_id {
            let status = match self.registry.get(&self.store_name) {
                Some(store) => store.get(&key).map_or(KeyStatus::Absent, KeyStatus::Found),
                None => KeyStatus::Unavailable {
                    reason: format!("store {} not registered locally", self.store_name),
                },
            };
            return (key, status);
        }

        match self.fetch_remote_value(&owner, &key).await {
            Ok(Some(value)) => (key, KeyStatus::Found(value)),
            Ok(None) => (key, KeyStatus::Absent),
            Err(e) => {
                warn!(instance = %owner.instance_id, key = %key, error = %e, "remote lookup degraded");
                (
                    key,
                    KeyStatus::Unavailable {
                        reason: format!("instance {} unreachable", owner.instance_id),
                    },
                )
            }
        }
    }

    /// Resolve a key's owner, retrying with bounded backoff while the
    /// partition is unassigned.
    async fn resolve_owner(&self, key: &str) -> Option<InstanceInfo> {
        let mut attempt = 0u32;
        loop {
            if let Some(owner) = self.metadata.snapshot().owner_for_key(key) {
                return Some(owner.clone());
            }
            if attempt >= self.config.owner_retry_attempts {
                return None;
            }
            attempt += 1;
            debug!(key, attempt, "partition unowned, retrying after backoff");
            tokio::time::sleep(self.config.owner_retry_backoff * attempt).await;
        }
    }

    async fn fetch_remote_value(
        &self,
        owner: &InstanceInfo,
        key: &str,
    ) -> Result<Option<serde_json::Value>, QueryError> {
        let response: ValueResponse = self
            .remote_json(owner, &format!("keys/{key}"))
            .await?;
        Ok(response.value)
    }

    async fn instance_keys(&self, instance: &InstanceInfo) -> Result<Vec<String>, QueryError> {
        if instance.instance_id == self.local_instance_id {
            return self
                .registry
                .get(&self.store_name)
                .map(|store| store.keys())
                .ok_or_else(|| QueryError::StoreNotFound(self.store_name.clone()));
        }
        self.remote_json(instance, "keys").await
    }

    async fn instance_count(&self, instance: &InstanceInfo) -> Result<u64, QueryError> {
        if instance.instance_id == self.local_instance_id {
            return self
                .registry
                .get(&self.store_name)
                .map(|store| store.len() as u64)
                .ok_or_else(|| QueryError::StoreNotFound(self.store_name.clone()));
        }
        let response: CountResponse = self.remote_json(instance, "count").await?;
        Ok(response.count)
    }

    async fn remote_json<T: serde::de::DeserializeOwned>(
        &self,
        instance: &InstanceInfo,
        path: &str,
    ) -> Result<T, QueryError> {
        let http = self.http.as_ref().ok_or(QueryError::ClientStopped)?;
        let url = format!(
            "http://{}/stores/{}/{}",
            instance.query_addr, self.store_name, path
        );
        let response = http
            .get(&url)
            .send()
            .await
            .map_err(|e| QueryError::Remote(e.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(QueryError::StoreNotFound(self.store_name.clone()));
        }
        let response = response
            .error_for_status()
            .map_err(|e| QueryError::Remote(e.to_string()))?;
        response
            .json()
            .await
            .map_err(|e| QueryError::Remote(e.to_string()))
    }
}
