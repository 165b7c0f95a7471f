//! # payrail Node
//!
//! Entry point for one pipeline instance. Initializes tracing, loads the
//! environment-driven configuration, starts the runtime, and serves until
//! Ctrl-C.

use anyhow::Result;
use payrail_runtime::{PipelineRuntime, RuntimeConfig};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load configuration
    let config = RuntimeConfig::from_env();

    // Create and start the pipeline instance
    let mut runtime = PipelineRuntime::new(config);
    runtime.start().await?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    // Graceful shutdown
    runtime.shutdown().await;

    Ok(())
}
