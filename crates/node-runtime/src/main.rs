//! # Cobalt Node
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (file named by `COBALT_CONFIG`, then environment)
//! 2. Initialize telemetry
//! 3. Build the consensus engine at the network's genesis block
//! 4. Mine startup blocks (regtest only)
//! 5. Wait for Ctrl+C

use anyhow::{Context, Result};
use cobalt_node::{load_config, NodeRuntime};
use cobalt_telemetry::init_telemetry;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config().context("Failed to load configuration")?;

    let _telemetry =
        init_telemetry(config.telemetry.clone()).context("Failed to initialize telemetry")?;

    let runtime = NodeRuntime::new(config).context("Failed to create node runtime")?;
    runtime.start().await.context("Failed to start node")?;

    info!("Node running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    runtime.shutdown().await;
    Ok(())
}
