//! # Cluster Metadata
//!
//! The partition-ownership map every instance holds independently. Routing a
//! key-addressed query is a pure function of (key, map) → instance address;
//! there is no central broker. Handles support atomic refresh because
//! ownership changes while partitions rebalance.

use parking_lot::RwLock;
use payrail_stores::logical_key;
use serde::{Deserialize, Serialize};
use shared_types::partition_for_key;
use std::sync::Arc;

/// Externally reachable identity of one pipeline instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceInfo {
    /// Stable instance identifier.
    pub instance_id: String,
    /// `host:port` of the instance's query endpoint.
    pub query_addr: String,
}

impl InstanceInfo {
    /// Create an instance descriptor.
    pub fn new(instance_id: impl Into<String>, query_addr: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            query_addr: query_addr.into(),
        }
    }
}

/// A snapshot of partition ownership across the cluster.
///
/// A partition with no owner means reassignment is in flight; callers retry
/// with bounded backoff before reporting the key unavailable.
#[derive(Debug, Clone)]
pub struct ClusterMetadata {
    partition_count: u32,
    owners: Vec<Option<InstanceInfo>>,
}

impl ClusterMetadata {
    /// A map with every partition unowned.
    #[must_use]
    pub fn new(partition_count: u32) -> Self {
        let partition_count = partition_count.max(1);
        Self {
            partition_count,
            owners: vec![None; partition_count as usize],
        }
    }

    /// A map with partitions distributed round-robin over `instances`.
    #[must_use]
    pub fn balanced(partition_count: u32, instances: &[InstanceInfo]) -> Self {
        let mut metadata = Self::new(partition_count);
        if instances.is_empty() {
            return metadata;
        }
        for partition in 0..metadata.partition_count {
            let owner = instances[(partition as usize) % instances.len()].clone();
            metadata.owners[partition as usize] = Some(owner);
        }
        metadata
    }

    /// Number of partitions the cluster carries.
    #[must_use]
    pub fn partition_count(&self) -> u32 {
        self.partition_count
    }

    /// Assign a partition to an instance.
    pub fn assign(&mut self, partition: u32, instance: InstanceInfo) {
        if let Some(slot) = self.owners.get_mut(partition as usize) {
            *slot = Some(instance);
        }
    }

    /// Mark a partition unowned (reassignment in flight).
    pub fn clear_owner(&mut self, partition: u32) {
        if let Some(slot) = self.owners.get_mut(partition as usize) {
            *slot = None;
        }
    }

    /// The instance owning a key's partition, if currently assigned.
    ///
    /// Composite windowed keys (`key@window_start`) route by their logical
    /// key so an entry's owner matches the partition of the records that
    /// produced it.
    #[must_use]
    pub fn owner_for_key(&self, key: &str) -> Option<&InstanceInfo> {
        let partition = partition_for_key(logical_key(key), self.partition_count);
        self.owners.get(partition as usize)?.as_ref()
    }

    /// Every distinct live instance, in first-owned-partition order.
    #[must_use]
    pub fn instances(&self) -> Vec<InstanceInfo> {
        let mut seen = Vec::new();
        for owner in self.owners.iter().flatten() {
            if !seen.iter().any(|i: &InstanceInfo| i.instance_id == owner.instance_id) {
                seen.push(owner.clone());
            }
        }
        seen
    }
}

/// Shared, refreshable view of [`ClusterMetadata`].
pub struct MetadataHandle {
    inner: Arc<RwLock<ClusterMetadata>>,
}

impl Clone for MetadataHandle {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl MetadataHandle {
    /// Wrap an initial ownership map.
    #[must_use]
    pub fn new(metadata: ClusterMetadata) -> Self {
        Self {
            inner: Arc::new(RwLock::new(metadata)),
        }
    }

    /// Current snapshot. Routing decisions are made against one snapshot,
    /// never a mix of two refreshes.
    #[must_use]
    pub fn snapshot(&self) -> ClusterMetadata {
        self.inner.read().clone()
    }

    /// Replace the map wholesale (periodic refresh).
    pub fn update(&self, metadata: ClusterMetadata) {
        *self.inner.write() = metadata;
    }
}
