//! # Account Ledger Stage
//!
//! Consumes the inflight channel and posts every leg to a per-account
//! running balance: debit legs subtract, credit legs add. This is the
//! authoritative ledger - for any settled transaction the debited account
//! drops by exactly the amount the credited account gains.

use crate::control::PauseControl;
use crate::domain::AccountBalance;
use crate::stages::PAUSE_POLL;
use payrail_stores::{KeyedReadHandle, KeyedStore};
use shared_bus::{InMemoryBus, Record, Subscription};
use shared_types::{PaymentCodec, PaymentState};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Construction parameters for the ledger stage.
#[derive(Debug, Clone)]
pub struct LedgerStageConfig {
    /// Channel the legs arrive on.
    pub inflight_channel: String,
}

impl Default for LedgerStageConfig {
    fn default() -> Self {
        Self {
            inflight_channel: "payments.inflight".to_string(),
        }
    }
}

/// The account ledger stage service.
pub struct AccountLedgerStage {
    bus: Arc<InMemoryBus>,
    codec: Arc<dyn PaymentCodec>,
    control: Arc<PauseControl>,
    config: LedgerStageConfig,
    store: Arc<KeyedStore<AccountBalance>>,
    shutdown_tx: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl AccountLedgerStage {
    /// Public name of the balance store on the query surface.
    pub const STORE_NAME: &'static str = "account-balances";

    /// Wire the stage. Nothing runs until [`AccountLedgerStage::start`].
    pub fn new(
        bus: Arc<InMemoryBus>,
        codec: Arc<dyn PaymentCodec>,
        control: Arc<PauseControl>,
        config: LedgerStageConfig,
    ) -> Self {
        Self {
            bus,
            codec,
            control,
            config,
            store: Arc::new(KeyedStore::new()),
            shutdown_tx: None,
            handle: None,
        }
    }

    /// Spawn the processing loop over the inflight channel. Idempotent.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            return;
        }
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let subscription = self.bus.subscribe(&self.config.inflight_channel);

        let codec = Arc::clone(&self.codec);
        let control = Arc::clone(&self.control);
        let store = Arc::clone(&self.store);
        let config = self.config.clone();

        self.shutdown_tx = Some(shutdown_tx);
        self.handle = Some(tokio::spawn(run(
            subscription,
            codec,
            control,
            store,
            config,
            shutdown_rx,
        )));
        info!(channel = %self.config.inflight_channel, "account ledger stage started");
    }

    /// Halt the loop and release its subscription. Idempotent; after this
    /// returns no further store mutation occurs.
    pub async fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Some(tx) = self.shutdown_tx.take() {
                let _ = tx.send(true);
            }
            let _ = handle.await;
            info!("account ledger stage stopped");
        }
    }

    /// Read-only handle over the balance store.
    #[must_use]
    pub fn store(&self) -> KeyedReadHandle<AccountBalance> {
        self.store.read_handle()
    }
}

async fn run(
    mut subscription: Subscription,
    codec: Arc<dyn PaymentCodec>,
    control: Arc<PauseControl>,
    store: Arc<KeyedStore<AccountBalance>>,
    config: LedgerStageConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    // Legs already posted, by (payment id, leg state). Rebuilt on replay,
    // which keeps at-least-once redelivery from double-posting.
    let mut applied: HashSet<(String, PaymentState)> = HashSet::new();

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
            record = subscription.recv() => {
                process_record(&codec, &store, &config, &mut applied, record);
            }
        }
    }
}

fn process_record(
    codec: &Arc<dyn PaymentCodec>,
    store: &KeyedStore<AccountBalance>,
    config: &LedgerStageConfig,
    applied: &mut HashSet<(String, PaymentState)>,
    record: Record,
) {
    let leg = match codec.deserialize(&record.value) {
        Ok(leg) => leg,
        Err(e) => {
            warn!(channel = %config.inflight_channel, error = %e, "dropping undecodable record");
            return;
        }
    };
    let Some(account) = leg.leg_account().map(str::to_owned) else {
        warn!(payment_id = %leg.payment_id, state = %leg.state, "non-leg record on inflight channel");
        return;
    };
    if !applied.insert((leg.payment_id.clone(), leg.state)) {
        debug!(payment_id = %leg.payment_id, state = %leg.state, "duplicate leg ignored");
        return;
    }

    let mut balance = store
        .get(&account)
        .unwrap_or_else(|| AccountBalance::new(account.as_str()));
    if let Err(e) = balance.apply(&leg) {
        warn!(error = %e, "leg not postable");
        return;
    }
    debug!(account = %account, balance = %balance.balance, "balance updated");
    store.put(account, balance);
}
