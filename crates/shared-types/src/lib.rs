//! # Shared Types - Domain Entities for the Payment Pipeline
//!
//! The single source of truth for the types that cross crate boundaries:
//!
//! - [`Payment`] and [`PaymentState`] - the record flowing through every
//!   channel, from `incoming` to `confirmed`.
//! - [`TimeWindow`] - fixed-duration event-time buckets used by the windowed
//!   stores.
//! - [`PaymentCodec`] - the pluggable serialization contract for channel
//!   payloads, with bincode and JSON implementations.
//! - [`partition_for_key`] - the key→partition assignment shared by the
//!   channel substrate and the federation client's ownership routing.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod codec;
pub mod entities;
pub mod errors;
pub mod partition;
pub mod window;

// Re-export main types
pub use codec::{BincodeCodec, JsonCodec, PaymentCodec};
pub use entities::{Payment, PaymentState};
pub use errors::{CodecError, PaymentError};
pub use partition::partition_for_key;
pub use window::TimeWindow;
