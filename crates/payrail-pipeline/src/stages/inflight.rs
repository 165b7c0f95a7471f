//! # Inflight Matching Stage
//!
//! Consumes incoming payments, splits each into a debit and a credit leg on
//! the inflight channel, tracks open legs per transaction in a windowed
//! store, and emits exactly one `complete` event once a transaction's legs
//! match. Legs that never match stay visible in the store until retention
//! eviction - there is no timeout emission.

use crate::control::PauseControl;
use crate::domain::InflightStats;
use crate::stages::{now_ms, publish_payment, EVICTION_INTERVAL, PAUSE_POLL};
use payrail_stores::{WindowedReadHandle, WindowedStore};
use shared_bus::{InMemoryBus, Record, Subscription};
use shared_types::{PaymentCodec, PaymentState};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Construction parameters for the matching stage.
#[derive(Debug, Clone)]
pub struct InflightStageConfig {
    /// Channel of incoming payments.
    pub incoming_channel: String,
    /// Channel the derived legs are published to.
    pub inflight_channel: String,
    /// Channel settled transactions are announced on.
    pub complete_channel: String,
    /// Matching window size in milliseconds.
    pub window_size_ms: i64,
    /// How long expired windows stay inspectable.
    pub retention_ms: i64,
}

impl Default for InflightStageConfig {
    fn default() -> Self {
        Self {
            incoming_channel: "payments.incoming".to_string(),
            inflight_channel: "payments.inflight".to_string(),
            complete_channel: "payments.complete".to_string(),
            window_size_ms: 60_000,
            retention_ms: 3_600_000,
        }
    }
}

/// The matching stage service.
pub struct InflightMatchingStage {
    bus: Arc<InMemoryBus>,
    codec: Arc<dyn PaymentCodec>,
    control: Arc<PauseControl>,
    config: InflightStageConfig,
    store: Arc<WindowedStore<InflightStats>>,
    shutdown_tx: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl InflightMatchingStage {
    /// Public name of the matching store on the query surface.
    pub const STORE_NAME: &'static str = "inflight-stats";

    /// Wire the stage. Nothing runs until [`InflightMatchingStage::start`].
    pub fn new(
        bus: Arc<InMemoryBus>,
        codec: Arc<dyn PaymentCodec>,
        control: Arc<PauseControl>,
        config: InflightStageConfig,
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

    /// Spawn the processing loop over the incoming channel. Idempotent.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            return;
        }
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let subscription = self.bus.subscribe(&self.config.incoming_channel);

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
        info!(channel = %self.config.incoming_channel, "inflight matching stage started");
    }

    /// Halt the loop and release its subscription. Idempotent; after this
    /// returns no further store mutation occurs.
    pub async fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Some(tx) = self.shutdown_tx.take() {
                let _ = tx.send(true);
            }
            let _ = handle.await;
            info!("inflight matching stage stopped");
        }
    }

    /// Read-only handle over the matching store.
    #[must_use]
    pub fn store(&self) -> WindowedReadHandle<InflightStats> {
        self.store.read_handle()
    }
}

async fn run(
    mut subscription: Subscription,
    bus: Arc<InMemoryBus>,
    codec: Arc<dyn PaymentCodec>,
    control: Arc<PauseControl>,
    store: Arc<WindowedStore<InflightStats>>,
    config: InflightStageConfig,
    mut shutdown: watch::Receiver<bool>,
) {
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
                process_record(&bus, &codec, &store, &config, record).await;
            }
        }
    }
}

async fn process_record(
    bus: &Arc<InMemoryBus>,
    codec: &Arc<dyn PaymentCodec>,
    store: &WindowedStore<InflightStats>,
    config: &InflightStageConfig,
    record: Record,
) {
    let payment = match codec.deserialize(&record.value) {
        Ok(payment) => payment,
        Err(e) => {
            warn!(channel = %config.incoming_channel, error = %e, "dropping undecodable record");
            return;
        }
    };
    if let Err(e) = payment.validate() {
        warn!(error = %e, "rejected malformed payment");
        return;
    }

    let window = store.window_for(payment.timestamp_ms);

    // At-least-once guard: a settled transaction re-delivered in the same
    // window is dropped whole - no legs republished, no second complete.
    if store
        .get(&payment.transaction_id, window)
        .is_some_and(|stats| stats.is_matched())
    {
        debug!(transaction_id = %payment.transaction_id, "duplicate delivery of settled transaction ignored");
        return;
    }

    let debit = payment.debit_leg();
    let credit = payment.credit_leg();
    publish_payment(bus, &config.inflight_channel, codec, &debit.from_account, &debit).await;
    publish_payment(bus, &config.inflight_channel, codec, &credit.to_account, &credit).await;

    let mut matched = false;
    store.update(&payment.transaction_id, window, |prev| {
        let mut stats = prev.cloned().unwrap_or_default();
        stats.apply_leg(&debit);
        stats.apply_leg(&credit);
        matched = stats.is_matched();
        stats
    });

    if matched {
        let complete = payment.with_state(PaymentState::Complete);
        publish_payment(
            bus,
            &config.complete_channel,
            codec,
            &complete.transaction_id,
            &complete,
        )
        .await;
        debug!(transaction_id = %complete.transaction_id, "transaction settled");
    }
}
