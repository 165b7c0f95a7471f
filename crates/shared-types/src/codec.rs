//! # Payment Codec
//!
//! The pluggable serialization contract for channel payloads. Channels carry
//! opaque bytes; stages hold a codec to encode on publish and decode on
//! consume. Implementations must round-trip payments losslessly.

use crate::entities::Payment;
use crate::errors::CodecError;

/// Serialize/deserialize contract for payment records on the wire.
pub trait PaymentCodec: Send + Sync {
    /// Encode a payment into channel payload bytes.
    fn serialize(&self, payment: &Payment) -> Result<Vec<u8>, CodecError>;

    /// Decode channel payload bytes back into a payment.
    fn deserialize(&self, bytes: &[u8]) -> Result<Payment, CodecError>;
}

/// Compact binary codec. The default for inter-stage channels.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl PaymentCodec for BincodeCodec {
    fn serialize(&self, payment: &Payment) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(payment).map_err(|e| CodecError::Serialize(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Payment, CodecError> {
        bincode::deserialize(bytes).map_err(|e| CodecError::Deserialize(e.to_string()))
    }
}

/// Human-readable JSON codec, useful for debugging channel contents.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl PaymentCodec for JsonCodec {
    fn serialize(&self, payment: &Payment) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(payment).map_err(|e| CodecError::Serialize(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Payment, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Deserialize(e.to_string()))
    }
}
