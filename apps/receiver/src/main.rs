//! pipedrop receiver entry point.

mod config;

use std::sync::Arc;

use pipedrop_receiver::ReceiverServer;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting pipedrop receiver"
    );

    let config = config::from_env()?;
    tracing::info!(port = config.port, "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config))?;

    tracing::info!("receiver shut down cleanly");
    Ok(())
}

async fn run(config: pipedrop_receiver::ServerConfig) -> anyhow::Result<()> {
    let server = ReceiverServer::new(config);

    let signal_server = Arc::clone(&server);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for ctrl-c: {e}");
            return;
        }
        tracing::info!("interrupt received, shutting down");
        signal_server.shutdown();
    });

    server.run().await?;
    Ok(())
}
