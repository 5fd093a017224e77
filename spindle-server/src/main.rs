//! Spindle — reverse-proxy load balancer daemon.
//!
//! Forwards every request on the catch-all surface to a dynamic pool of
//! backend origin servers, health-checking each backend periodically and
//! quarantining the persistently slow ones. `/admin/*` exposes read-only
//! inspection endpoints.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use spindle_core::forward::ForwardingEngine;
use spindle_core::health::{HealthChecker, ServerRegistry};
use spindle_core::{discovery, strategy, BalancerConfig};

mod api;
mod ingress;
mod router;
mod state;

#[cfg(test)]
mod test_helpers;

use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("SPINDLE_CONFIG").ok())
        .unwrap_or_else(|| "spindle.json".to_string());

    // A broken config file is a startup error and a non-zero exit.
    let config = Arc::new(
        BalancerConfig::load(Path::new(&config_path))
            .with_context(|| format!("loading configuration from {config_path}"))?,
    );

    let discovery = discovery::from_config(&config);
    let strategy = strategy::from_config(&config);
    tracing::info!(
        "Using discovery '{}' and strategy '{}'",
        discovery.name(),
        strategy.name()
    );

    let registry = Arc::new(ServerRegistry::new(Arc::clone(&discovery), Arc::clone(&config)));
    registry.reconcile();

    let engine = Arc::new(
        ForwardingEngine::new(Arc::clone(&registry), Arc::clone(&strategy), &config)
            .context("building forwarding client")?,
    );

    let checker = HealthChecker::new(Arc::clone(&registry), Arc::clone(&config))
        .context("building health-check client")?;
    let checker_task = checker.start();

    let app = router::build_router(AppState {
        registry,
        strategy,
        discovery,
        engine,
    });

    let bind_addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;

    tracing::info!("🌐 Spindle listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(Arc::clone(&checker)))
        .await?;

    // The checker was signalled before the listener drained; wait for the
    // loop to actually exit before releasing the registry.
    let _ = checker_task.await;

    Ok(())
}

/// The health checker stops first; in-flight forwards then drain through
/// axum's graceful shutdown.
async fn shutdown_signal(checker: Arc<HealthChecker>) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received, stopping health checker"),
        Err(e) => tracing::error!("Failed to listen for shutdown signal, stopping: {}", e),
    }
    checker.shutdown();
}
