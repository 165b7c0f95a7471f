//! # payrail Test Suite
//!
//! Unified test crate containing cross-crate scenarios:
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── pipeline_flows.rs   # End-to-end settlement through all stages
//!     └── federation.rs       # Multi-instance state query federation
//! ```
//!
//! Run with `cargo test -p payrail-tests`.

pub mod integration;
