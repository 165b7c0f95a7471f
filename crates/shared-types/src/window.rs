//! # Time Windows
//!
//! Fixed-duration event-time buckets. A record's window is a pure function of
//! its timestamp and the window size, so every instance buckets identically.

use serde::{Deserialize, Serialize};

/// A half-open event-time bucket `[start_ms, end_ms)`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TimeWindow {
    /// Inclusive start, milliseconds since the epoch.
    pub start_ms: i64,
    /// Exclusive end, milliseconds since the epoch.
    pub end_ms: i64,
}

impl TimeWindow {
    /// The window of `size_ms` duration containing `timestamp_ms`.
    ///
    /// Uses euclidean flooring so pre-epoch timestamps bucket correctly.
    #[must_use]
    pub fn containing(timestamp_ms: i64, size_ms: i64) -> Self {
        debug_assert!(size_ms > 0, "window size must be positive");
        let start_ms = timestamp_ms.div_euclid(size_ms) * size_ms;
        Self {
            start_ms,
            end_ms: start_ms + size_ms,
        }
    }

    /// Whether `timestamp_ms` falls inside this window.
    #[must_use]
    pub fn contains(&self, timestamp_ms: i64) -> bool {
        timestamp_ms >= self.start_ms && timestamp_ms < self.end_ms
    }

    /// Window duration in milliseconds.
    #[must_use]
    pub fn size_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}..{})", self.start_ms, self.end_ms)
    }
}
