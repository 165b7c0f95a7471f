//! # Shared Errors
//!
//! Error types for payment validation and codec round-tripping.

use rust_decimal::Decimal;
use thiserror::Error;

/// Validation failures rejected at a stage's ingestion boundary.
///
/// These are logged and skipped, never propagated as processing faults.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// Payment amount is zero or negative.
    #[error("payment {payment_id}: non-positive amount {amount}")]
    NonPositiveAmount {
        /// Offending record id.
        payment_id: String,
        /// The rejected amount.
        amount: Decimal,
    },

    /// One of the account ids is empty.
    #[error("payment {payment_id}: empty account id")]
    EmptyAccount {
        /// Offending record id.
        payment_id: String,
    },

    /// The transaction id is empty.
    #[error("payment {payment_id}: empty transaction id")]
    EmptyTransactionId {
        /// Offending record id.
        payment_id: String,
    },
}

/// Codec serialization/deserialization failures.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Serialization failed.
    #[error("serialize: {0}")]
    Serialize(String),

    /// Deserialization failed (corrupt or foreign payload).
    #[error("deserialize: {0}")]
    Deserialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_positive_amount_display() {
        let err = PaymentError::NonPositiveAmount {
            payment_id: "rec-1".into(),
            amount: Decimal::from(-3),
        };
        assert!(err.to_string().contains("rec-1"));
        assert!(err.to_string().contains("-3"));
    }

    #[test]
    fn test_codec_error_display() {
        let err = CodecError::Deserialize("truncated".into());
        assert!(err.to_string().contains("truncated"));
    }
}
