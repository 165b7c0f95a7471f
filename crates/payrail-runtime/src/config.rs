//! # Runtime Configuration
//!
//! Plain config structs with sane defaults and `PAYRAIL_*` environment
//! overrides. Peers are declared as `id=host:port` pairs so a small static
//! cluster needs no discovery service.

use payrail_query::InstanceInfo;
use tracing::warn;

/// Channel names by pipeline role.
#[derive(Debug, Clone)]
pub struct ChannelNames {
    /// Producer → inflight matching stage.
    pub incoming: String,
    /// Matching stage → account ledger stage.
    pub inflight: String,
    /// Matching stage → confirmation stage.
    pub complete: String,
    /// Confirmation stage → downstream consumers.
    pub confirmed: String,
}

impl Default for ChannelNames {
    fn default() -> Self {
        Self {
            incoming: "payments.incoming".to_string(),
            inflight: "payments.inflight".to_string(),
            complete: "payments.complete".to_string(),
            confirmed: "payments.confirmed".to_string(),
        }
    }
}

/// Complete configuration for one pipeline instance.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Stable identity of this instance in cluster metadata.
    pub instance_id: String,
    /// Listen address for the query endpoint (`host:port`, port 0 works).
    pub query_listen_addr: String,
    /// Externally-reachable query address, when it differs from the bound
    /// one (NAT, container). Defaults to the bound address.
    pub advertised_query_addr: Option<String>,
    /// Partitions per channel and for store ownership.
    pub partition_count: u32,
    /// Windowed store bucket size in milliseconds.
    pub window_size_ms: i64,
    /// Windowed store retention in milliseconds.
    pub retention_ms: i64,
    /// Channel names by role.
    pub channels: ChannelNames,
    /// Other known instances of the cluster.
    pub peers: Vec<InstanceInfo>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            instance_id: uuid::Uuid::new_v4().to_string(),
            query_listen_addr: "127.0.0.1:7467".to_string(),
            advertised_query_addr: None,
            partition_count: 4,
            window_size_ms: 60_000,
            retention_ms: 3_600_000,
            channels: ChannelNames::default(),
            peers: Vec::new(),
        }
    }
}

impl RuntimeConfig {
    /// Defaults overridden from the environment:
    ///
    /// - `PAYRAIL_INSTANCE_ID`
    /// - `PAYRAIL_QUERY_ADDR` (listen address)
    /// - `PAYRAIL_ADVERTISED_ADDR`
    /// - `PAYRAIL_PARTITIONS`
    /// - `PAYRAIL_WINDOW_MS`
    /// - `PAYRAIL_RETENTION_MS`
    /// - `PAYRAIL_PEERS` (comma-separated `id=host:port`)
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(id) = std::env::var("PAYRAIL_INSTANCE_ID") {
            config.instance_id = id;
        }
        if let Ok(addr) = std::env::var("PAYRAIL_QUERY_ADDR") {
            config.query_listen_addr = addr;
        }
        if let Ok(addr) = std::env::var("PAYRAIL_ADVERTISED_ADDR") {
            config.advertised_query_addr = Some(addr);
        }
        if let Ok(partitions) = std::env::var("PAYRAIL_PARTITIONS") {
            match partitions.parse() {
                Ok(n) => config.partition_count = n,
                Err(_) => warn!(value = %partitions, "PAYRAIL_PARTITIONS is not a number, keeping default"),
            }
        }
        if let Ok(window) = std::env::var("PAYRAIL_WINDOW_MS") {
            if let Ok(n) = window.parse() {
                config.window_size_ms = n;
            }
        }
        if let Ok(retention) = std::env::var("PAYRAIL_RETENTION_MS") {
            if let Ok(n) = retention.parse() {
                config.retention_ms = n;
            }
        }
        if let Ok(peers) = std::env::var("PAYRAIL_PEERS") {
            config.peers = parse_peers(&peers);
        }

        config
    }
}

fn parse_peers(raw: &str) -> Vec<InstanceInfo> {
    raw.split(',')
        .filter(|entry| !entry.trim().is_empty())
        .filter_map(|entry| {
            let (id, addr) = entry.trim().split_once('=').or_else(|| {
                warn!(entry, "ignoring malformed peer entry (expected id=host:port)");
                None
            })?;
            Some(InstanceInfo::new(id.trim(), addr.trim()))
        })
        .collect()
}
