//! Mining Monitor API Server
//!
//! Polls difficulty, hashrate and price providers on a schedule and serves
//! the latest accepted snapshot over HTTP.

mod app;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mining_services::{AggregationCycle, FallbackResolver, HostPacers, MonitorConfig, Scheduler, SnapshotStore};
use mining_sources::{build_http_client, CoinGeckoClient, PriceSource, SourceRegistry};

use crate::app::{build_router, AppState, ServiceInfo};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,mining_api=debug")),
        )
        .init();

    let config = MonitorConfig::from_env()?;
    info!(
        "Starting Mining Monitor for {:?} (minimum {} per cycle)",
        config.tracked_ids(),
        config.min_accepted_coins
    );
    for coin in &config.tracked {
        let chain: Vec<String> = config.chain_for(coin.id).iter().map(|k| k.to_string()).collect();
        info!("{} source chain: {}", coin.id, chain.join(" -> "));
    }

    // One HTTP client and one pacer per host, shared by every chain
    let http = build_http_client(config.request_timeout)?;
    let registry = SourceRegistry::new(http.clone(), config.static_source.clone());
    let pacers = HostPacers::new(config.pacing_interval);
    let resolver = FallbackResolver::from_config(&config, &registry, &pacers);

    let prices = CoinGeckoClient::new(http).with_pre_call_delay(config.price_pre_call_delay);
    let price_label = prices.label().to_string();

    let store = Arc::new(SnapshotStore::new());
    let cycle = AggregationCycle::new(&config, resolver, Arc::new(prices), store);
    let scheduler = Arc::new(Scheduler::new(Arc::new(cycle), config.refresh_interval));

    let shutdown = CancellationToken::new();
    let scheduler_handle = tokio::spawn(Arc::clone(&scheduler).run(shutdown.clone()));

    let info = ServiceInfo::new(&config, &scheduler, &price_label);
    let app = build_router(AppState::new(scheduler, info));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    if let Err(e) = scheduler_handle.await {
        error!("Scheduler task ended abnormally: {}", e);
    }
    for stats in pacers.stats() {
        info!(
            "[Pacer:{}] {} requests, {} waited for a slot",
            stats.host, stats.total_requests, stats.waited_requests
        );
    }
    info!("Mining Monitor stopped");

    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM, or when something else cancels `token`
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to register SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = token.cancelled() => {},
    }
    info!("Received shutdown signal, draining");
    token.cancel();
}
