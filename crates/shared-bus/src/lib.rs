//! # Shared Bus - Durable Ordered Channels Between Pipeline Stages
//!
//! Stages never call each other directly: every hand-off goes through a named
//! channel carrying key-value [`Record`]s.
//!
//! ```text
//! ┌──────────────┐                      ┌──────────────┐
//! │   Stage A    │                      │   Stage B    │
//! │              │     publish()        │              │
//! │              │ ───────┐             │              │
//! └──────────────┘        ▼             └──────────────┘
//!                   ┌──────────────┐           ↑
//!                   │   Channel    │           │
//!                   │  (partitions)│ ──────────┘
//!                   └──────────────┘   subscribe().recv()
//! ```
//!
//! ## Delivery contract
//!
//! - Records with the same key land on the same partition; each partition is
//!   strictly FIFO.
//! - Logs are retained: a fresh subscription starts at the earliest offset,
//!   which is also the restart/recovery story (replay from the log).
//! - Delivery is at-least-once; consumers must tolerate duplicates.

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod publisher;
pub mod record;
pub mod subscriber;
mod topic;

// Re-export main types
pub use publisher::{ChannelPublisher, InMemoryBus};
pub use record::{Record, RecordPosition};
pub use subscriber::Subscription;

use thiserror::Error;

/// Default number of partitions per channel.
pub const DEFAULT_PARTITIONS: u32 = 4;

/// Channel substrate errors.
///
/// The in-memory bus cannot fail a publish; the variant exists for real
/// substrates behind the same trait.
#[derive(Debug, Error)]
pub enum BusError {
    /// Transient I/O failure in the underlying substrate.
    #[error("channel io: {0}")]
    Io(String),
}
