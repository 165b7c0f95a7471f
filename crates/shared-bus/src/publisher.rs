//! # Channel Publisher
//!
//! The publishing side of the channel substrate.

use crate::record::{Record, RecordPosition};
use crate::subscriber::Subscription;
use crate::topic::TopicLog;
use crate::{BusError, DEFAULT_PARTITIONS};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Trait for appending records to a named channel.
///
/// Real deployments would back this with a replicated log; the pipeline
/// stages only depend on this contract.
#[async_trait]
pub trait ChannelPublisher: Send + Sync {
    /// Append a record, returning where it landed.
    async fn publish(&self, channel: &str, record: Record) -> Result<RecordPosition, BusError>;

    /// Total records published through this publisher.
    fn records_published(&self) -> u64;
}

/// In-memory implementation of the channel substrate.
///
/// Channels are created on first use with a fixed partition count. Logs are
/// retained for the lifetime of the bus, which is what lets a restarted
/// stage (or a fresh subscription) replay from the earliest offset.
pub struct InMemoryBus {
    topics: RwLock<HashMap<String, Arc<TopicLog>>>,
    partitions_per_channel: u32,
    records_published: AtomicU64,
}

impl InMemoryBus {
    /// Create a bus with the default partition count per channel.
    #[must_use]
    pub fn new() -> Self {
        Self::with_partitions(DEFAULT_PARTITIONS)
    }

    /// Create a bus with a specific partition count per channel.
    #[must_use]
    pub fn with_partitions(partitions_per_channel: u32) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            partitions_per_channel: partitions_per_channel.max(1),
            records_published: AtomicU64::new(0),
        }
    }

    /// Subscribe to a channel, starting at the earliest retained record.
    #[must_use]
    pub fn subscribe(&self, channel: &str) -> Subscription {
        let topic = self.topic(channel);
        debug!(channel, "new subscription");
        Subscription::new(channel.to_string(), topic)
    }

    /// Number of partitions a channel carries.
    #[must_use]
    pub fn partition_count(&self, channel: &str) -> u32 {
        self.topic(channel).partition_count()
    }

    /// Total records retained on a channel.
    #[must_use]
    pub fn channel_len(&self, channel: &str) -> u64 {
        self.topic(channel).len()
    }

    fn topic(&self, channel: &str) -> Arc<TopicLog> {
        if let Some(topic) = self.topics.read().get(channel) {
            return Arc::clone(topic);
        }
        let mut topics = self.topics.write();
        Arc::clone(
            topics
                .entry(channel.to_string())
                .or_insert_with(|| Arc::new(TopicLog::new(self.partitions_per_channel))),
        )
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChannelPublisher for InMemoryBus {
    async fn publish(&self, channel: &str, record: Record) -> Result<RecordPosition, BusError> {
        let topic = self.topic(channel);
        let position = topic.append(record);
        self.records_published.fetch_add(1, Ordering::Relaxed);
        debug!(
            channel,
            partition = position.partition,
            offset = position.offset,
            "record published"
        );
        Ok(position)
    }

    fn records_published(&self) -> u64 {
        self.records_published.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_counts() {
        let bus = InMemoryBus::new();
        bus.publish("payments.incoming", Record::new("k", vec![], 0))
            .await
            .unwrap();
        bus.publish("payments.incoming", Record::new("k", vec![], 0))
            .await
            .unwrap();

        assert_eq!(bus.records_published(), 2);
        assert_eq!(bus.channel_len("payments.incoming"), 2);
    }

    #[tokio::test]
    async fn test_channels_are_isolated() {
        let bus = InMemoryBus::new();
        bus.publish("a", Record::new("k", vec![], 0)).await.unwrap();

        assert_eq!(bus.channel_len("a"), 1);
        assert_eq!(bus.channel_len("b"), 0);
    }

    #[tokio::test]
    async fn test_same_key_preserves_order() {
        let bus = InMemoryBus::with_partitions(8);
        let a = bus
            .publish("c", Record::new("neil", vec![1], 0))
            .await
            .unwrap();
        let b = bus
            .publish("c", Record::new("neil", vec![2], 0))
            .await
            .unwrap();

        assert_eq!(a.partition, b.partition);
        assert!(b.offset > a.offset);
    }

    #[test]
    fn test_default_bus() {
        let bus = InMemoryBus::default();
        assert_eq!(bus.records_published(), 0);
        assert_eq!(bus.partition_count("x"), DEFAULT_PARTITIONS);
    }
}
