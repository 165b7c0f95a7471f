//! Matching state for one transaction within one time window.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared_types::{Payment, PaymentState};

/// Per-(transaction, window) aggregate of unmatched legs.
///
/// `net_amount` is signed: debit legs subtract, credit legs add, so it is
/// non-zero exactly while a leg is unmatched and returns to zero once both
/// legs are in. `count` is the number of observed legs; 2 means matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InflightStats {
    /// Signed sum of observed leg amounts; zero once matched.
    pub net_amount: Decimal,
    /// Observed open-leg count.
    pub count: u32,
}

impl InflightStats {
    /// Fold one leg into the aggregate. Non-leg states are ignored.
    pub fn apply_leg(&mut self, leg: &Payment) {
        match leg.state {
            PaymentState::Debit => self.net_amount -= leg.amount,
            PaymentState::Credit => self.net_amount += leg.amount,
            _ => return,
        }
        self.count += 1;
    }

    /// Both legs observed; the transaction has settled.
    #[must_use]
    pub fn is_matched(&self) -> bool {
        self.count >= 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment() -> Payment {
        Payment::incoming("txn-1", "rec-1", "neil", "john", Decimal::from(10), 0)
    }

    #[test]
    fn test_single_leg_leaves_net_open() {
        let mut stats = InflightStats::default();
        stats.apply_leg(&payment().debit_leg());

        assert_eq!(stats.count, 1);
        assert_eq!(stats.net_amount, Decimal::from(-10));
        assert!(!stats.is_matched());
    }

    #[test]
    fn test_both_legs_net_to_zero() {
        let mut stats = InflightStats::default();
        stats.apply_leg(&payment().debit_leg());
        stats.apply_leg(&payment().credit_leg());

        assert_eq!(stats.count, 2);
        assert_eq!(stats.net_amount, Decimal::ZERO);
        assert!(stats.is_matched());
    }

    #[test]
    fn test_non_leg_state_ignored() {
        let mut stats = InflightStats::default();
        stats.apply_leg(&payment());

        assert_eq!(stats.count, 0);
        assert_eq!(stats.net_amount, Decimal::ZERO);
    }
}
