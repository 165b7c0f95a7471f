//! # Pause Control
//!
//! A shared, externally-toggleable gate. Stage loops poll it between
//! processing units: checking before dequeue means toggling takes effect
//! within one unit's latency and never drops or reorders input.

use std::sync::atomic::{AtomicBool, Ordering};

/// An atomically-readable pause flag shared between an operator and the
/// stage loops. Construction starts in the running state.
#[derive(Debug, Default)]
pub struct PauseControl {
    paused: AtomicBool,
}

impl PauseControl {
    /// Create a control in the running (unpaused) state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop stages from consuming further input. Idempotent.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    /// Let stages resume from exactly where they stopped. Idempotent.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    /// Polled by stage loops between processing units.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}
