//! Per-account running balances - the authoritative ledger.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared_types::{Payment, PaymentState};
use thiserror::Error;

/// Ledger application errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Only debit/credit legs may post to the ledger.
    #[error("payment {payment_id}: state {state} is not a postable leg")]
    NotALeg {
        /// Offending record id.
        payment_id: String,
        /// The non-leg state encountered.
        state: PaymentState,
    },
}

/// A per-account running total.
///
/// Created at first touching leg; debit legs subtract, credit legs add;
/// never deleted (append-only ledger semantics).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Account identifier.
    pub account_id: String,
    /// Signed running balance.
    pub balance: Decimal,
}

impl AccountBalance {
    /// A fresh account at balance zero.
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            balance: Decimal::ZERO,
        }
    }

    /// Post one leg: `balance -= amount` for a debit, `+= amount` for a
    /// credit.
    pub fn apply(&mut self, leg: &Payment) -> Result<(), LedgerError> {
        match leg.state {
            PaymentState::Debit => self.balance -= leg.amount,
            PaymentState::Credit => self.balance += leg.amount,
            state => {
                return Err(LedgerError::NotALeg {
                    payment_id: leg.payment_id.clone(),
                    state,
                })
            }
        }
        Ok(())
    }
}
