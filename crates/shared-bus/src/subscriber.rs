//! # Channel Subscriber
//!
//! The consuming side of the channel substrate. A subscription owns a
//! per-partition cursor into a channel's retained logs; it never removes
//! records, so any number of subscriptions consume independently.

use crate::record::Record;
use crate::topic::TopicLog;
use std::sync::Arc;

/// A cursor over one channel's partitions, starting at the earliest offset.
///
/// `recv`/`try_recv` drain partitions round-robin, preserving per-partition
/// FIFO order. Re-reading after [`Subscription::seek_to_start`] is the replay
/// path used to rebuild stage state after a restart.
pub struct Subscription {
    channel: String,
    topic: Arc<TopicLog>,
    /// Next offset to read, per partition.
    cursors: Vec<u64>,
    /// Partition to try first on the next read, for fairness.
    next_partition: usize,
}

impl Subscription {
    pub(crate) fn new(channel: String, topic: Arc<TopicLog>) -> Self {
        let cursors = vec![0; topic.partition_count() as usize];
        Self {
            channel,
            topic,
            cursors,
            next_partition: 0,
        }
    }

    /// The channel this subscription reads.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Receive the next record, waiting until one is appended.
    pub async fn recv(&mut self) -> Record {
        loop {
            let topic = Arc::clone(&self.topic);
            let mut appended = std::pin::pin!(topic.appended());
            // Enable the waiter before checking, so an append between the
            // check and the await cannot be missed.
            appended.as_mut().enable();
            if let Some(record) = self.try_recv() {
                return record;
            }
            appended.await;
        }
    }

    /// Receive the next record without blocking.
    pub fn try_recv(&mut self) -> Option<Record> {
        let partitions = self.cursors.len();
        for i in 0..partitions {
            let p = (self.next_partition + i) % partitions;
            let offset = self.cursors[p];
            if let Some(record) = self.topic.read(p as u32, offset) {
                self.cursors[p] = offset + 1;
                self.next_partition = (p + 1) % partitions;
                return Some(record);
            }
        }
        None
    }

    /// Rewind every cursor to the earliest offset (full replay).
    pub fn seek_to_start(&mut self) {
        self.cursors.iter_mut().for_each(|c| *c = 0);
        self.next_partition = 0;
    }

    /// Current next-offset cursor per partition.
    #[must_use]
    pub fn position(&self) -> &[u64] {
        &self.cursors
    }

    /// Records appended but not yet read by this subscription.
    #[must_use]
    pub fn lag(&self) -> u64 {
        self.cursors
            .iter()
            .enumerate()
            .map(|(p, cursor)| self.topic.partition_len(p as u32).saturating_sub(*cursor))
            .sum()
    }
}
