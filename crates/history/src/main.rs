//! Yield watcher - follows the live yield stream
//!
//! Keeps a rolling history per protocol and asset and logs the latest APYs
//! on a fixed interval.

use std::sync::Arc;

use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use yield_core::WatchConfig;
use yield_history::YieldWatcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("Starting yield watcher v{}", env!("CARGO_PKG_VERSION"));

    let config = WatchConfig::load()?;
    let report_interval = config.report_interval();
    let watcher = Arc::new(YieldWatcher::new(config));

    let stream = {
        let watcher = Arc::clone(&watcher);
        tokio::spawn(async move { watcher.run().await })
    };
    tokio::pin!(stream);

    let mut report = tokio::time::interval(report_interval);
    report.tick().await;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = report.tick() => {
                let history = watcher.history();
                let (series, points) = {
                    let history = history.read();
                    (history.series_count(), history.point_count())
                };
                info!(
                    messages = watcher.message_count(),
                    rejected = watcher.rejected_count(),
                    series,
                    points,
                    "Yield history"
                );
                for line in watcher.report() {
                    info!("{}", line);
                }
            }
            _ = &mut stream => {
                info!("Yield stream ended");
                break;
            }
            result = &mut shutdown => {
                result?;
                break;
            }
        }
    }

    info!("Watcher shutdown complete");
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
