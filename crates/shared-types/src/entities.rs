//! # Payment Entities
//!
//! The payment record and its lifecycle states. A single incoming payment is
//! split into a debit leg and a credit leg; both carry the parent transaction
//! id so the matching stage can pair them back up.

use crate::errors::PaymentError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a payment record as it moves through the pipeline.
///
/// ```text
/// incoming ──split──▶ debit / credit ──match──▶ complete ──aggregate──▶ confirmed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    /// Freshly submitted, not yet split into legs.
    Incoming,
    /// The leg debiting `from_account`.
    Debit,
    /// The leg crediting `to_account`.
    Credit,
    /// Both legs observed; the transfer has settled.
    Complete,
    /// Settlement aggregated into confirmation statistics.
    Confirmed,
}

impl PaymentState {
    /// Lowercase channel-suffix form, e.g. `payments.incoming`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Incoming => "incoming",
            PaymentState::Debit => "debit",
            PaymentState::Credit => "credit",
            PaymentState::Complete => "complete",
            PaymentState::Confirmed => "confirmed",
        }
    }
}

impl std::fmt::Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable payment record.
///
/// `transaction_id` groups the two legs of one transfer; `payment_id` is
/// unique per record. Amounts are exact decimals - never floats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Groups the debit and credit legs of one transfer.
    pub transaction_id: String,
    /// Unique id of this record.
    pub payment_id: String,
    /// Account the amount is debited from.
    pub from_account: String,
    /// Account the amount is credited to.
    pub to_account: String,
    /// Transfer amount. Non-negative on valid records.
    pub amount: Decimal,
    /// Current lifecycle state.
    pub state: PaymentState,
    /// Event time in milliseconds since the epoch.
    pub timestamp_ms: i64,
}

impl Payment {
    /// Create an `incoming` payment.
    pub fn incoming(
        transaction_id: impl Into<String>,
        payment_id: impl Into<String>,
        from_account: impl Into<String>,
        to_account: impl Into<String>,
        amount: Decimal,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            payment_id: payment_id.into(),
            from_account: from_account.into(),
            to_account: to_account.into(),
            amount,
            state: PaymentState::Incoming,
            timestamp_ms,
        }
    }

    /// Validate the fields a stage must reject at its boundary.
    ///
    /// Malformed payments are never split into legs: a non-positive amount,
    /// an empty transaction id, or an empty account id fails here.
    pub fn validate(&self) -> Result<(), PaymentError> {
        if self.transaction_id.is_empty() {
            return Err(PaymentError::EmptyTransactionId {
                payment_id: self.payment_id.clone(),
            });
        }
        if self.from_account.is_empty() || self.to_account.is_empty() {
            return Err(PaymentError::EmptyAccount {
                payment_id: self.payment_id.clone(),
            });
        }
        if self.amount <= Decimal::ZERO {
            return Err(PaymentError::NonPositiveAmount {
                payment_id: self.payment_id.clone(),
                amount: self.amount,
            });
        }
        Ok(())
    }

    /// Derive the debit leg, keyed by [`Payment::from_account`].
    #[must_use]
    pub fn debit_leg(&self) -> Payment {
        self.with_state(PaymentState::Debit)
    }

    /// Derive the credit leg, keyed by [`Payment::to_account`].
    #[must_use]
    pub fn credit_leg(&self) -> Payment {
        self.with_state(PaymentState::Credit)
    }

    /// Copy of this record with a different lifecycle state.
    #[must_use]
    pub fn with_state(&self, state: PaymentState) -> Payment {
        let mut next = self.clone();
        next.state = state;
        next
    }

    /// The account a leg applies to: `from_account` for a debit leg,
    /// `to_account` for a credit leg. `None` for non-leg states.
    #[must_use]
    pub fn leg_account(&self) -> Option<&str> {
        match self.state {
            PaymentState::Debit => Some(&self.from_account),
            PaymentState::Credit => Some(&self.to_account),
            _ => None,
        }
    }
}
