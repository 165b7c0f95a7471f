//! Query federation errors.

use thiserror::Error;

/// Errors surfaced by the query server and federation client.
///
/// Per-key and per-instance failures inside a batch are *not* errors: they
/// degrade that key/instance to an unavailable marker in the result. These
/// variants cover whole-call failures only.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The client was stopped; its network resources are released.
    #[error("query client stopped")]
    ClientStopped,

    /// The named store is not registered on the queried instance.
    #[error("store not found: {0}")]
    StoreNotFound(String),

    /// A remote query call failed (transport, status, or decode).
    #[error("remote call failed: {0}")]
    Remote(String),

    /// The query server could not bind its listen address.
    #[error("bind {addr}: {source}")]
    Bind {
        /// The requested listen address.
        addr: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
