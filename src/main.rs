//! Vantron Media Server binary.
//!
//! Boots logging, reads environment configuration, and runs the WebSocket
//! server until shutdown.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use vantron_media::{MediaServer, NullEngine, ServerConfig, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Vantron Media Server v{}", VERSION);

    let config = ServerConfig::from_env();
    let server = MediaServer::new(config, Arc::new(NullEngine));
    server.run().await.context("Fatal error in media server")?;

    Ok(())
}
