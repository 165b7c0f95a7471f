//! # Confirmation Aggregation Stage
//!
//! Consumes `complete` events, folds each settled amount into the
//! per-window confirmation aggregate, and publishes the `confirmed` echo
//! downstream.

use crate::control::PauseControl;
use crate::domain::ConfirmedStats;
use crate::stages::{now_ms, publish_payment, EVICTION_INTERVAL, PAUSE_POLL};
use payrail_stores::{WindowedReadHandle, WindowedStore};
use shared_bus::{InMemoryBus, Record, Subscription};
use shared_types::{PaymentCodec, PaymentState};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Construction parameters for the confirmation stage.
#[derive(Debug, Clone)]
pub struct ConfirmationStageConfig {
    /// Channel settled transactions arrive on.
    pub complete_channel: String,
    /// Channel confirmed payments are published to.
    pub confirmed_channel: String,
    /// Aggregation window size in milliseconds.
    pub window_size_ms: i64,
    /// How long closed windows stay inspectable.
    pub retention_ms: i64,
}

impl Default for ConfirmationStageConfig {
    fn default() -> Self {
        Self {
            complete_channel: "payments.complete".to_string(),
            confirmed_channel: "payments.confirmed".to_string(),
            window_size_ms: 60_000,
            retention_ms: 3_600_000,
        }
    }
}

/// The confirmation aggregation stage service.
pub struct ConfirmationStage {
    bus: Arc<InMemoryBus>,
    codec: Arc<dyn PaymentCodec>,
    control: Arc<PauseControl>,
    config: ConfirmationStageConfig,
    store: Arc<WindowedStore<ConfirmedStats>>,
    shutdown_tx: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl ConfirmationStage {
    /// Public name of the confirmation store on the query surface.
    pub const STORE_NAME: &'static str = "confirmed-stats";

    /// Logical key the per-window aggregate is stored under.
    pub const AGGREGATE_KEY: &'static str = "confirmed";

    /// Wire the stage. Nothing runs until [`ConfirmationStage::start`].
    pub fn new(
        bus: Arc<InMemoryBus>,
        codec: Arc<dyn PaymentCodec>,
        control: Arc<PauseControl>,
        config: ConfirmationStageConfig,
    ) -> Self {
        let store = Arc::new(WindowedStore::new(
            config.window_size_ms,
            config.retention_ms,
        ));
        Self {
            bus,
            codec,
            control,
            config,
            store,
            shutdown_tx: None,
            handle: None,
        }
    }

    /// Spawn the processing loop over the complete channel. Idempotent.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            return;
        }
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let subscription = self.bus.subscribe(&self.config.complete_channel);

        let bus = Arc::clone(&self.bus);
        let codec = Arc::clone(&self.codec);
        let control = Arc::clone(&self.control);
        let store = Arc::clone(&self.store);
        let config = self.config.clone();

        self.shutdown_tx = Some(shutdown_tx);
        self.handle = Some(tokio::spawn(run(
            subscription,
            bus,
            codec,
            control,
            store,
            config,
            shutdown_rx,
        )));
        info!(channel = %self.config.complete_channel, "confirmation stage started");
    }

    /// Halt the loop and release its subscription. Idempotent; after this
    /// returns no further store mutation occurs.
    pub async fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Some(tx) = self.shutdown_tx.take() {
                let _ = tx.send(true);
            }
            let _ = handle.await;
            info!("confirmation stage stopped");
        }
    }

    /// Read-only handle over the confirmation store.
    #[must_use]
    pub fn store(&self) -> WindowedReadHandle<ConfirmedStats> {
        self.store.read_handle()
    }
}

async fn run(
    mut subscription: Subscription,
    bus: Arc<InMemoryBus>,
    codec: Arc<dyn PaymentCodec>,
    control: Arc<PauseControl>,
    store: Arc<WindowedStore<ConfirmedStats>>,
    config: ConfirmationStageConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    // Transactions already confirmed; rebuilt on replay so at-least-once
    // redelivery never double-counts.
    let mut confirmed: HashSet<String> = HashSet::new();
    let mut eviction = tokio::time::interval(EVICTION_INTERVAL);

    loop {
        if *shutdown.borrow() {
            break;
        }
        if control.is_paused() {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(PAUSE_POLL) => {}
            }
            continue;
        }
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = eviction.tick() => {
                store.evict_expired(now_ms());
            }
            record = subscription.recv() => {
                process_record(&bus, &codec, &store, &config, &mut confirmed, record).await;
            }
        }
    }
}

async fn process_record(
    bus: &Arc<InMemoryBus>,
    codec: &Arc<dyn PaymentCodec>,
    store: &WindowedStore<ConfirmedStats>,
    config: &ConfirmationStageConfig,
    confirmed: &mut HashSet<String>,
    record: Record,
) {
    let payment = match codec.deserialize(&record.value) {
        Ok(payment) => payment,
        Err(e) => {
            warn!(channel = %config.complete_channel, error = %e, "dropping undecodable record");
            return;
        }
    };
    if payment.state != PaymentState::Complete {
        warn!(payment_id = %payment.payment_id, state = %payment.state, "non-complete record on complete channel");
        return;
    }
    if !confirmed.insert(payment.transaction_id.clone()) {
        debug!(transaction_id = %payment.transaction_id, "duplicate complete event ignored");
        return;
    }

    // Late events land back in their own (possibly closed) window; windows
    // never merge and late data never opens a new one.
    let window = store.window_for(payment.timestamp_ms);
    store.update(ConfirmationStage::AGGREGATE_KEY, window, |prev| {
        let mut stats = prev
            .cloned()
            .unwrap_or_else(|| ConfirmedStats::new(window));
        stats.record(payment.amount);
        stats
    });

    let echo = payment.with_state(PaymentState::Confirmed);
    publish_payment(
        bus,
        &config.confirmed_channel,
        codec,
        &echo.transaction_id,
        &echo,
    )
    .await;
    debug!(transaction_id = %echo.transaction_id, window = %window, "payment confirmed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared_bus::ChannelPublisher;
    use shared_types::{BincodeCodec, Payment};
    use std::time::Duration;
    use tokio::time::timeout;

    fn stage_fixture() -> (Arc<InMemoryBus>, ConfirmationStage) {
        let bus = Arc::new(InMemoryBus::new());
        let stage = ConfirmationStage::new(
            Arc::clone(&bus),
            Arc::new(BincodeCodec),
            Arc::new(PauseControl::new()),
            ConfirmationStageConfig::default(),
        );
        (bus, stage)
    }

    fn complete_event(txn: &str, amount: i64, timestamp_ms: i64) -> Payment {
        Payment::incoming(txn, format!("rec-{txn}"), "neil", "john", Decimal::from(amount), timestamp_ms)
            .with_state(PaymentState::Complete)
    }

    async fn submit(bus: &Arc<InMemoryBus>, event: &Payment) {
        let bytes = BincodeCodec.serialize(event).unwrap();
        bus.publish(
            "payments.complete",
            Record::new(event.transaction_id.as_str(), bytes, event.timestamp_ms),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_aggregates_and_confirms() {
        let (bus, mut stage) = stage_fixture();
        stage.start();

        let mut confirmed = bus.subscribe("payments.confirmed");
        submit(&bus, &complete_event("tnxId", 10, 1_000)).await;

        let echo = timeout(Duration::from_secs(1), confirmed.recv()).await.unwrap();
        let echo = BincodeCodec.deserialize(&echo.value).unwrap();
        assert_eq!(echo.state, PaymentState::Confirmed);

        let entries = stage.store().entries();
        assert_eq!(entries.len(), 1);
        let (key, stats) = &entries[0];
        assert_eq!(key.key, ConfirmationStage::AGGREGATE_KEY);
        assert_eq!(stats.amount, Decimal::from(10));
        assert_eq!(stats.count, 1);

        stage.stop().await;
    }

    #[tokio::test]
    async fn test_same_window_accumulates() {
        let (bus, mut stage) = stage_fixture();
        stage.start();

        let mut confirmed = bus.subscribe("payments.confirmed");
        submit(&bus, &complete_event("txn-1", 10, 1_000)).await;
        submit(&bus, &complete_event("txn-2", 5, 2_000)).await;
        timeout(Duration::from_secs(1), confirmed.recv()).await.unwrap();
        timeout(Duration::from_secs(1), confirmed.recv()).await.unwrap();

        let entries = stage.store().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].1.amount, Decimal::from(15));
        assert_eq!(entries[0].1.count, 2);

        stage.stop().await;
    }

    #[tokio::test]
    async fn test_late_event_reopens_window() {
        let (bus, mut stage) = stage_fixture();
        stage.start();

        let mut confirmed = bus.subscribe("payments.confirmed");
        // A whole window later, then a late event back into the first window.
        submit(&bus, &complete_event("txn-1", 10, 1_000)).await;
        submit(&bus, &complete_event("txn-2", 20, 61_000)).await;
        submit(&bus, &complete_event("txn-3", 5, 2_000)).await;
        for _ in 0..3 {
            timeout(Duration::from_secs(1), confirmed.recv()).await.unwrap();
        }

        let entries = stage.store().entries();
        assert_eq!(entries.len(), 2);
        // Oldest window first: the late event folded into it.
        assert_eq!(entries[0].1.amount, Decimal::from(15));
        assert_eq!(entries[0].1.count, 2);
        assert_eq!(entries[1].1.amount, Decimal::from(20));

        stage.stop().await;
    }

    #[tokio::test]
    async fn test_duplicate_complete_counted_once() {
        let (bus, mut stage) = stage_fixture();
        stage.start();

        let mut confirmed = bus.subscribe("payments.confirmed");
        submit(&bus, &complete_event("txn-1", 10, 1_000)).await;
        submit(&bus, &complete_event("txn-1", 10, 1_000)).await;

        timeout(Duration::from_secs(1), confirmed.recv()).await.unwrap();
        assert!(
            timeout(Duration::from_millis(200), confirmed.recv())
                .await
                .is_err()
        );
        assert_eq!(stage.store().entries()[0].1.count, 1);

        stage.stop().await;
    }
}
