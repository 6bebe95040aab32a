//! castfeed-collector subscribes to a hub's merged-event feed, keeps the
//! casts out of it and forwards them to an HTTP sink in bounded batches.

pub mod config;
pub mod error;
pub mod events;
pub mod hub;
pub mod monitor;
pub mod sink;

use crate::config::CollectorConfig;
use crate::hub::WsHubClient;
use crate::monitor::FeedMonitor;
use crate::sink::HttpBatchSink;
use batcher::CastBatcher;
use clock::WallClock;
use std::sync::Arc;
use tracing::info;

/// Runs the collector until a termination signal, then flushes once and returns.
pub async fn run(config: CollectorConfig) -> anyhow::Result<()> {
    let sink = HttpBatchSink::new(&config.sink_url)?;
    let batcher = CastBatcher::new(config.batch, Arc::new(sink));
    let hub = WsHubClient::new(config.hub_url, config.hub_auth_token);
    let monitor = FeedMonitor::new(Arc::new(hub), batcher.clone(), Arc::new(WallClock));

    tokio::select! {
        _ = monitor.run() => {}
        result = shutdown_signal() => {
            result?;
            info!("Termination signal received, flushing pending casts");
        }
    }
    batcher.shutdown().await;

    Ok(())
}

#[cfg(not(windows))]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::signal;
    use tokio::signal::unix::SignalKind;

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = sigint.recv() => {}
        _ = sigterm.recv() => {}
    }
    Ok(())
}

#[cfg(windows)]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
