//! # Query Endpoint
//!
//! Serves one instance's local partition of every registered store:
//!
//! - `GET /stores/:store/keys/:key` - point lookup
//! - `GET /stores/:store/keys` - key enumeration
//! - `GET /stores/:store/entries` - full enumeration
//! - `GET /stores/:store/count` - row count
//!
//! Unknown store names get a distinguishable 404; a missing key on a known
//! store is a 200 with a null value.

use crate::error::QueryError;
use crate::registry::StoreRegistry;
use crate::wire::{CountResponse, KeyValueRow, ValueResponse};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use std::net::SocketAddr;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// HTTP server exposing the local store partitions for federation.
pub struct QueryServer {
    registry: StoreRegistry,
    local_addr: Option<SocketAddr>,
    shutdown_tx: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl QueryServer {
    /// Wire a server over a registry. Nothing listens until
    /// [`QueryServer::start`].
    #[must_use]
    pub fn new(registry: StoreRegistry) -> Self {
        Self {
            registry,
            local_addr: None,
            shutdown_tx: None,
            handle: None,
        }
    }

    /// Bind `addr` (`host:port`, port 0 for ephemeral) and serve. Idempotent;
    /// returns the bound address.
    pub async fn start(&mut self, addr: &str) -> Result<SocketAddr, QueryError> {
        if let Some(local) = self.local_addr {
            return Ok(local);
        }
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| QueryError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        let local = listener.local_addr().map_err(|source| QueryError::Bind {
            addr: addr.to_string(),
            source,
        })?;

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let app = router(self.registry.clone());
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        });

        self.handle = Some(tokio::spawn(async move {
            if let Err(e) = server.await {
                error!(error = %e, "query server terminated");
            }
        }));
        self.shutdown_tx = Some(shutdown_tx);
        self.local_addr = Some(local);
        info!(%local, "query endpoint listening");
        Ok(local)
    }

    /// The bound address, once started.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Stop serving. Idempotent.
    pub async fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Some(tx) = self.shutdown_tx.take() {
                let _ = tx.send(true);
            }
            let _ = handle.await;
            self.local_addr = None;
            info!("query endpoint stopped");
        }
    }
}

fn router(registry: StoreRegistry) -> Router {
    Router::new()
        .route("/stores/:store/keys", get(list_keys))
        .route("/stores/:store/keys/:key", get(get_value))
        .route("/stores/:store/entries", get(list_entries))
        .route("/stores/:store/count", get(count))
        .with_state(registry)
}

async fn get_value(
    State(registry): State<StoreRegistry>,
    Path((store, key)): Path<(String, String)>,
) -> Result<Json<ValueResponse>, StatusCode> {
    let store = registry.get(&store).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(ValueResponse {
        value: store.get(&key),
    }))
}

async fn list_keys(
    State(registry): State<StoreRegistry>,
    Path(store): Path<String>,
) -> Result<Json<Vec<String>>, StatusCode> {
    let store = registry.get(&store).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(store.keys()))
}

async fn list_entries(
    State(registry): State<StoreRegistry>,
    Path(store): Path<String>,
) -> Result<Json<Vec<KeyValueRow>>, StatusCode> {
    let store = registry.get(&store).ok_or(StatusCode::NOT_FOUND)?;
    let rows = store
        .entries()
        .into_iter()
        .map(|(key, value)| KeyValueRow { key, value })
        .collect();
    Ok(Json(rows))
}

async fn count(
    State(registry): State<StoreRegistry>,
    Path(store): Path<String>,
) -> Result<Json<CountResponse>, StatusCode> {
    let store = registry.get(&store).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(CountResponse {
        count: store.len() as u64,
    }))
}
