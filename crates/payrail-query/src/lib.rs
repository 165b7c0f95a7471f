//! # payrail Query Federation
//!
//! Lets any pipeline instance answer "what is the value for key K / what is
//! the total row count" for a partitioned store, even when K's state lives on
//! another instance:
//!
//! - [`ClusterMetadata`] maps partitions to owning instances; every instance
//!   holds (and refreshes) its own copy behind a [`MetadataHandle`].
//! - [`QueryServer`] serves each instance's local partition of every
//!   registered store over HTTP.
//! - [`StateQueryClient`] routes each key to its owner - reading in-process
//!   for local keys, calling the owner's endpoint for remote ones - and
//!   scatter-gathers `key_set()`/`size()` across all live instances with
//!   per-call timeouts. Partial completion is a first-class result, never an
//!   error.

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod client;
pub mod error;
pub mod metadata;
pub mod registry;
pub mod server;
pub mod wire;

// Re-export main types
pub use client::{
    BatchResult, KeySetResult, KeyStatus, QueryClientConfig, SizeResult, StateQueryClient,
};
pub use error::QueryError;
pub use metadata::{ClusterMetadata, InstanceInfo, MetadataHandle};
pub use registry::StoreRegistry;
pub use server::QueryServer;
