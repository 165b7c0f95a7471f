//! Retained partition logs backing one channel.

use crate::record::{Record, RecordPosition};
use parking_lot::RwLock;
use shared_types::partition_for_key;
use tokio::sync::Notify;

/// One channel's retained state: a fixed set of append-only partition logs
/// plus a notifier that wakes blocked subscribers on any append.
pub(crate) struct TopicLog {
    partitions: Vec<RwLock<Vec<Record>>>,
    notify: Notify,
}

impl TopicLog {
    pub(crate) fn new(partition_count: u32) -> Self {
        let partitions = (0..partition_count.max(1))
            .map(|_| RwLock::new(Vec::new()))
            .collect();
        Self {
            partitions,
            notify: Notify::new(),
        }
    }

    pub(crate) fn partition_count(&self) -> u32 {
        self.partitions.len() as u32
    }

    /// Append a record to the partition its key hashes to.
    pub(crate) fn append(&self, record: Record) -> RecordPosition {
        let partition = partition_for_key(&record.key, self.partition_count());
        let offset = {
            let mut log = self.partitions[partition as usize].write();
            log.push(record);
            (log.len() - 1) as u64
        };
        self.notify.notify_waiters();
        RecordPosition { partition, offset }
    }

    /// Read the record at (partition, offset), if appended yet.
    pub(crate) fn read(&self, partition: u32, offset: u64) -> Option<Record> {
        self.partitions
            .get(partition as usize)?
            .read()
            .get(offset as usize)
            .cloned()
    }

    /// Records retained in one partition.
    pub(crate) fn partition_len(&self, partition: u32) -> u64 {
        self.partitions
            .get(partition as usize)
            .map_or(0, |log| log.read().len() as u64)
    }

    /// Total records retained across all partitions.
    pub(crate) fn len(&self) -> u64 {
        (0..self.partition_count())
            .map(|p| self.partition_len(p))
            .sum()
    }

    /// Future resolving after the next append. Create the future *before*
    /// checking the logs to avoid a missed-wakeup race.
    pub(crate) fn appended(&self) -> tokio::sync::futures::Notified<'_> {
        self.notify.notified()
    }
}
