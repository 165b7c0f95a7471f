//! Per-window confirmation totals over settled payments.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared_types::TimeWindow;

/// Per-window aggregate of settled payment amounts.
///
/// Additive: a late-arriving complete event for an already-closed window is
/// folded back into that window's aggregate; windows never merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedStats {
    /// Window start, milliseconds since the epoch.
    pub window_start_ms: i64,
    /// Window end, milliseconds since the epoch.
    pub window_end_ms: i64,
    /// Sum of confirmed amounts in the window.
    pub amount: Decimal,
    /// Number of confirmed payments in the window.
    pub count: u64,
}

impl ConfirmedStats {
    /// An empty aggregate for one window.
    #[must_use]
    pub fn new(window: TimeWindow) -> Self {
        Self {
            window_start_ms: window.start_ms,
            window_end_ms: window.end_ms,
            amount: Decimal::ZERO,
            count: 0,
        }
    }

    /// Fold one settled payment into the aggregate.
    pub fn record(&mut self, amount: Decimal) {
        self.amount += amount;
        self.count += 1;
    }
}
