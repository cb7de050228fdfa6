//! Caching Proxy - A forward HTTP proxy with a bounded response cache

use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tokio::task::JoinError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use caching_proxy::{create_router, error::CacheError, CacheClient, Config, ProxyState};

/// Main entry point for the caching proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Parse configuration from flags and environment variables
/// 3. Create the cache and start its actor task
/// 4. Create Axum router forwarding every request
/// 5. Start HTTP server on configured port
/// 6. On SIGINT/SIGTERM drain the server, then stop the cache
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "caching_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting caching proxy");

    let config = Config::parse();
    let cache_config = config.validate()?;
    let origin = config.origin_url()?;
    info!(
        "Configuration loaded: origin={}, port={}, strategy={}, capacity={}, sweep_interval={}s",
        origin,
        config.port,
        cache_config.strategy,
        cache_config.capacity,
        config.sweep_interval
    );

    let cache = CacheClient::new(cache_config)?;
    let actor = cache.spawn();
    info!("Cache actor started");

    let state = ProxyState::new(origin, cache.clone())?;
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Proxy listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // Server is drained: no handler can submit to the cache any more
    cache.stop().await;
    if let Some(failure) = actor_failure(actor.await) {
        warn!("{}", failure);
    }

    let stats = cache.stats().await;
    info!(
        "Final cache stats: {}",
        serde_json::to_string(&stats).unwrap_or_default()
    );
    info!("Proxy shutdown complete");
    Ok(())
}

/// Describes how the cache actor task ended, if it ended badly.
fn actor_failure(result: Result<Result<(), CacheError>, JoinError>) -> Option<String> {
    match result {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(format!("Cache actor exited with error: {}", e)),
        Err(e) => Some(format!("Cache actor task failed: {}", e)),
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
