//! # Channel Records
//!
//! What channels carry: a string key (transaction or account id), opaque
//! value bytes produced by the payment codec, and the event timestamp.

use serde::{Deserialize, Serialize};

/// A key-value record as appended to a channel partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Routing key; records with equal keys share a partition.
    pub key: String,
    /// Codec-encoded payload.
    pub value: Vec<u8>,
    /// Event time in milliseconds since the epoch.
    pub timestamp_ms: i64,
}

impl Record {
    /// Create a record.
    pub fn new(key: impl Into<String>, value: Vec<u8>, timestamp_ms: i64) -> Self {
        Self {
            key: key.into(),
            value,
            timestamp_ms,
        }
    }
}

/// Where a published record landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordPosition {
    /// Partition index within the channel.
    pub partition: u32,
    /// Zero-based offset within the partition.
    pub offset: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_construction() {
        let r = Record::new("txn-1", vec![1, 2, 3], 42);
        assert_eq!(r.key, "txn-1");
        assert_eq!(r.value, vec![1, 2, 3]);
        assert_eq!(r.timestamp_ms, 42);
    }
}
