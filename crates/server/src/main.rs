//! Yield server - live protocol yields over HTTP and WebSocket
//!
//! Main entry point

use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use yield_core::AppConfig;
use yield_server::{YieldServerBuilder, YieldService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Starting yield server v{}", env!("CARGO_PKG_VERSION"));

    // Missing RPC URLs are fatal here, before anything is served
    let config = AppConfig::load()?;
    let service = YieldService::from_config(&config)?;

    service.start();
    info!("Background services started");

    let server = YieldServerBuilder::from_config(&config).build(service.clone());

    // Setup shutdown channel
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    tokio::spawn(async move {
        if let Err(e) = shutdown_signal().await {
            error!("Failed to listen for shutdown signals: {}", e);
        }
        let _ = shutdown_tx.send(());
    });

    info!("Yield server listening on {}", server.address());
    info!("Press Ctrl+C to shutdown");

    let result = server.start_with_shutdown(shutdown_rx).await;
    service.stop().await;

    if let Err(e) = result {
        error!("Server error: {}", e);
        return Err(e);
    }

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    #[cfg(unix)]
    let terminate = async move {
        terminate.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        result = signal::ctrl_c() => {
            result?;
            info!("Received Ctrl+C");
        }
        _ = terminate => {
            info!("Received termination signal");
        }
    }

    Ok(())
}
