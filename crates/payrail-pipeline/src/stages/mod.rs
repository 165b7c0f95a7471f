//! # Pipeline Stages
//!
//! Each stage follows the same service shape: `new()` wires dependencies,
//! `start()` spawns the single-threaded processing loop, `stop().await` is
//! idempotent and guarantees no further store mutation after it returns, and
//! `store()` exposes a read-only handle over the stage's materialized state.

pub mod confirmed;
pub mod inflight;
pub mod ledger;

use shared_bus::{ChannelPublisher, InMemoryBus, Record};
use shared_types::{Payment, PaymentCodec};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

/// How often a paused loop re-checks the pause control.
pub const PAUSE_POLL: Duration = Duration::from_millis(25);

/// How often windowed stages run retention eviction.
pub const EVICTION_INTERVAL: Duration = Duration::from_secs(30);

/// Wall-clock milliseconds since the epoch, used as the eviction "now".
pub(crate) fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Encode and publish a payment under the given record key.
///
/// Publish failures are logged and left to the substrate's at-least-once
/// redelivery; stages do not retry themselves.
pub(crate) async fn publish_payment(
    bus: &Arc<InMemoryBus>,
    channel: &str,
    codec: &Arc<dyn PaymentCodec>,
    key: &str,
    payment: &Payment,
) {
    let bytes = match codec.serialize(payment) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(channel, payment_id = %payment.payment_id, error = %e, "codec failed to serialize payment");
            return;
        }
    };
    if let Err(e) = bus
        .publish(channel, Record::new(key, bytes, payment.timestamp_ms))
        .await
    {
        warn!(channel, error = %e, "publish failed; relying on substrate redelivery");
    }
}
