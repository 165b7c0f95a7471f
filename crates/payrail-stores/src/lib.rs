//! # payrail Stores
//!
//! Materialized state maintained incrementally by the pipeline stages:
//!
//! - [`KeyedStore`] - a plain key→value map (the account ledger).
//! - [`WindowedStore`] - entries keyed by (key, time window) with
//!   retention-based expiry (inflight matching, confirmation stats).
//!
//! ## Single-writer discipline
//!
//! Only the owning stage holds the mutation handle; everyone else - the
//! federation client's local-read path, the query endpoint, tests - reads
//! through a cloneable read handle. Readers observe current state without
//! blocking the writer beyond the lock's short critical sections; consistency
//! is eventual, not snapshot.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod keyed;
pub mod query;
pub mod windowed;

// Re-exports
pub use keyed::{KeyedReadHandle, KeyedStore};
pub use query::QueryableStore;
pub use windowed::{logical_key, WindowedKey, WindowedReadHandle, WindowedStore};
