//! # payrail Pipeline
//!
//! The three cooperating processing stages of the payment reconciliation
//! pipeline, coupled only through durable channels:
//!
//! ```text
//! payments.incoming ──▶ InflightMatchingStage ──▶ payments.inflight ──▶ AccountLedgerStage
//!                              │
//!                              └──▶ payments.complete ──▶ ConfirmationStage ──▶ payments.confirmed
//! ```
//!
//! Each stage runs a single-threaded processing loop over its input channel
//! and is the sole mutator of its materialized store; readers (the state
//! query federation, tests) observe through read handles. Every loop polls
//! the shared [`PauseControl`] between processing units and honors an
//! idempotent, awaitable `stop()`.

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod control;
pub mod domain;
pub mod stages;

// Re-export main types
pub use control::PauseControl;
pub use domain::{AccountBalance, ConfirmedStats, InflightStats, LedgerError};
pub use stages::confirmed::{ConfirmationStage, ConfirmationStageConfig};
pub use stages::inflight::{InflightMatchingStage, InflightStageConfig};
pub use stages::ledger::{AccountLedgerStage, LedgerStageConfig};
