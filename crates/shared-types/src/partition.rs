//! # Partition Assignment
//!
//! Deterministic key→partition assignment. The channel substrate uses it to
//! place records, and the federation client uses the same function to resolve
//! which instance owns a key's state - the two must never disagree.

use sha2::{Digest, Sha256};

/// Assign a string key to one of `partition_count` partitions.
///
/// Hash-modulo assignment: stable across processes and platforms.
#[must_use]
pub fn partition_for_key(key: &str, partition_count: u32) -> u32 {
    if partition_count == 0 {
        return 0;
    }

    let digest = Sha256::digest(key.as_bytes());
    let value = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    value % partition_count
}
