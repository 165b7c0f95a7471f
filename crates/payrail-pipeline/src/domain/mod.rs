//! # Pipeline Domain Aggregates
//!
//! The materialized values each stage maintains: open-leg matching stats,
//! per-account running balances, and per-window confirmation totals.

pub mod confirmed;
pub mod inflight;
pub mod ledger;

pub use confirmed::ConfirmedStats;
pub use inflight::InflightStats;
pub use ledger::{AccountBalance, LedgerError};
