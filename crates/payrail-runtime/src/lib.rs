//! # payrail Runtime
//!
//! Wires one complete pipeline instance:
//!
//! 1. Create shared infrastructure (channel bus, pause control, codec)
//! 2. Construct the three stages and register their stores for querying
//! 3. Start the stages (each spawns its processing loop)
//! 4. Serve the query endpoint and publish cluster metadata
//!
//! ```text
//! payments.incoming ─▶ InflightMatchingStage ─▶ payments.inflight ─▶ AccountLedgerStage
//!                             │
//!                             └─▶ payments.complete ─▶ ConfirmationStage ─▶ payments.confirmed
//!
//!            StateQueryClient ──▶ inflight-stats / account-balances / confirmed-stats
//! ```

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;

pub use config::{ChannelNames, RuntimeConfig};

use anyhow::{Context, Result};
use payrail_pipeline::{
    AccountLedgerStage, ConfirmationStage, ConfirmationStageConfig, InflightMatchingStage,
    InflightStageConfig, LedgerStageConfig, PauseControl,
};
use payrail_pipeline::{AccountBalance, ConfirmedStats, InflightStats};
use payrail_query::{
    ClusterMetadata, InstanceInfo, MetadataHandle, QueryServer, StateQueryClient, StoreRegistry,
};
use payrail_stores::{KeyedReadHandle, WindowedReadHandle};
use shared_bus::{ChannelPublisher, InMemoryBus, Record};
use shared_types::{BincodeCodec, Payment, PaymentCodec};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// One pipeline instance: bus, stages, stores, and query federation.
pub struct PipelineRuntime {
    config: RuntimeConfig,
    bus: Arc<InMemoryBus>,
    codec: Arc<dyn PaymentCodec>,
    control: Arc<PauseControl>,
    registry: StoreRegistry,
    metadata: MetadataHandle,
    inflight: InflightMatchingStage,
    ledger: AccountLedgerStage,
    confirmation: ConfirmationStage,
    server: QueryServer,
}

impl PipelineRuntime {
    /// Construct all components. Nothing runs until
    /// [`PipelineRuntime::start`].
    #[must_use]
    pub fn new(config: RuntimeConfig) -> Self {
        let bus = Arc::new(InMemoryBus::with_partitions(config.partition_count));
        let codec: Arc<dyn PaymentCodec> = Arc::new(BincodeCodec);
        let control = Arc::new(PauseControl::new());

        let inflight = InflightMatchingStage::new(
            Arc::clone(&bus),
            Arc::clone(&codec),
            Arc::clone(&control),
            InflightStageConfig {
                incoming_channel: config.channels.incoming.clone(),
                inflight_channel: config.channels.inflight.clone(),
                complete_channel: config.channels.complete.clone(),
                window_size_ms: config.window_size_ms,
                retention_ms: config.retention_ms,
            },
        );
        let ledger = AccountLedgerStage::new(
            Arc::clone(&bus),
            Arc::clone(&codec),
            Arc::clone(&control),
            LedgerStageConfig {
                inflight_channel: config.channels.inflight.clone(),
            },
        );
        let confirmation = ConfirmationStage::new(
            Arc::clone(&bus),
            Arc::clone(&codec),
            Arc::clone(&control),
            ConfirmationStageConfig {
                complete_channel: config.channels.complete.clone(),
                confirmed_channel: config.channels.confirmed.clone(),
                window_size_ms: config.window_size_ms,
                retention_ms: config.retention_ms,
            },
        );

        let registry = StoreRegistry::new();
        registry.register(
            InflightMatchingStage::STORE_NAME,
            Arc::new(inflight.store()),
        );
        registry.register(AccountLedgerStage::STORE_NAME, Arc::new(ledger.store()));
        registry.register(
            ConfirmationStage::STORE_NAME,
            Arc::new(confirmation.store()),
        );

        let metadata = MetadataHandle::new(ClusterMetadata::new(config.partition_count));
        let server = QueryServer::new(registry.clone());

        Self {
            config,
            bus,
            codec,
            control,
            registry,
            metadata,
            inflight,
            ledger,
            confirmation,
            server,
        }
    }

    /// Start the stages, serve the query endpoint, and publish cluster
    /// metadata (this instance plus configured peers, partitions balanced).
    pub async fn start(&mut self) -> Result<()> {
        info!(instance_id = %self.config.instance_id, "starting pipeline instance");

        self.inflight.start();
        self.ledger.start();
        self.confirmation.start();

        let local = self
            .server
            .start(&self.config.query_listen_addr)
            .await
            .context("query endpoint failed to start")?;
        let advertised = self
            .config
            .advertised_query_addr
            .clone()
            .unwrap_or_else(|| local.to_string());

        let mut instances = vec![InstanceInfo::new(
            self.config.instance_id.clone(),
            advertised,
        )];
        instances.extend(self.config.peers.iter().cloned());
        self.metadata.update(ClusterMetadata::balanced(
            self.config.partition_count,
            &instances,
        ));

        info!(
            instance_id = %self.config.instance_id,
            query_addr = %local,
            peers = self.config.peers.len(),
            "pipeline instance running"
        );
        Ok(())
    }

    /// Stop the stages, then the query endpoint. Idempotent.
    pub async fn shutdown(&mut self) {
        info!(instance_id = %self.config.instance_id, "shutting down pipeline instance");
        self.ledger.stop().await;
        self.inflight.stop().await;
        self.confirmation.stop().await;
        self.server.stop().await;
        info!("shutdown complete");
    }

    /// Encode and publish an incoming payment, keyed by transaction id.
    pub async fn submit(&self, payment: &Payment) -> Result<()> {
        let bytes = self
            .codec
            .serialize(payment)
            .context("payment did not serialize")?;
        self.bus
            .publish(
                &self.config.channels.incoming,
                Record::new(payment.transaction_id.as_str(), bytes, payment.timestamp_ms),
            )
            .await
            .context("incoming channel publish failed")?;
        Ok(())
    }

    /// A federation client over one of this instance's store names.
    #[must_use]
    pub fn client_for(&self, store_name: &str) -> StateQueryClient {
        StateQueryClient::new(
            store_name,
            self.metadata.clone(),
            self.config.instance_id.clone(),
            self.registry.clone(),
        )
    }

    /// The shared channel bus (producers and downstream consumers).
    #[must_use]
    pub fn bus(&self) -> Arc<InMemoryBus> {
        Arc::clone(&self.bus)
    }

    /// The shared pause switch.
    #[must_use]
    pub fn pause_control(&self) -> Arc<PauseControl> {
        Arc::clone(&self.control)
    }

    /// This instance's cluster metadata handle.
    #[must_use]
    pub fn metadata(&self) -> MetadataHandle {
        self.metadata.clone()
    }

    /// Bound query endpoint address, once started.
    #[must_use]
    pub fn query_addr(&self) -> Option<SocketAddr> {
        self.server.local_addr()
    }

    /// This instance's configuration.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Read handle over the matching store.
    #[must_use]
    pub fn inflight_store(&self) -> WindowedReadHandle<InflightStats> {
        self.inflight.store()
    }

    /// Read handle over the balance store.
    #[must_use]
    pub fn balance_store(&self) -> KeyedReadHandle<AccountBalance> {
        self.ledger.store()
    }

    /// Read handle over the confirmation store.
    #[must_use]
    pub fn confirmed_store(&self) -> WindowedReadHandle<ConfirmedStats> {
        self.confirmation.store()
    }
}
