//! Periodic backend health probing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;

use crate::client::build_http_client;
use crate::config::BalancerConfig;
use crate::error::CoreResult;
use crate::health::record::BackendHealth;
use crate::health::registry::ServerRegistry;

/// Probes every tracked backend on a fixed interval and applies the
/// verdicts to the registry's records, with slowness cooldown taking
/// precedence over probe results.
pub struct HealthChecker {
    registry: Arc<ServerRegistry>,
    client: reqwest::Client,
    config: Arc<BalancerConfig>,
    shutdown_tx: tokio::sync::watch::Sender<bool>,
}

impl HealthChecker {
    pub fn new(registry: Arc<ServerRegistry>, config: Arc<BalancerConfig>) -> CoreResult<Arc<Self>> {
        let client = build_http_client(config.health_check_timeout_seconds)?;
        let (shutdown_tx, _) = tokio::sync::watch::channel(false);

        Ok(Arc::new(Self {
            registry,
            client,
            config,
            shutdown_tx,
        }))
    }

    /// Start the background probe loop. The first tick fires one interval
    /// after startup; the initial reconcile at boot covers the gap.
    pub fn start(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let checker = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let period = Duration::from_millis(self.config.health_check_interval_ms);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        checker.run_once().await;
                    }
                    _ = shutdown_rx.changed() => {
                        tracing::info!("Health checker shutting down");
                        break;
                    }
                }
            }
        })
    }

    /// One full probe round: refresh the pool for dynamic sources, then
    /// probe every record concurrently so a single slow backend cannot
    /// stall the rest.
    pub(crate) async fn run_once(&self) {
        if self.registry.discovery().supports_dynamic_updates() {
            self.registry.reconcile();
        }

        let servers = self.registry.all_snapshot();
        tracing::debug!("Starting health checks for {} servers", servers.len());

        join_all(servers.iter().map(|server| self.check_server(server))).await;
    }

    async fn check_server(&self, server: &Arc<BackendHealth>) {
        let started = Instant::now();
        let is_healthy = self.probe(server.url()).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        self.apply_probe_result(server, is_healthy, elapsed_ms);
    }

    /// `GET {url}/actuator/health`, healthy iff the JSON body carries a
    /// `status` field equal to `UP` (case-insensitive). Any non-2xx,
    /// undecodable body, or transport error is unhealthy.
    async fn probe(&self, url: &str) -> bool {
        let response = match self.client.get(format!("{url}/actuator/health")).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Health probe for {} failed: {}", url, e);
                return false;
            }
        };

        if !response.status().is_success() {
            tracing::debug!(
                "Health probe for {} returned status {}",
                url,
                response.status()
            );
            return false;
        }

        let body: serde_json::Value = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!("Health probe for {} returned unreadable body: {}", url, e);
                return false;
            }
        };

        body.get("status")
            .and_then(|status| status.as_str())
            .is_some_and(|status| status.eq_ignore_ascii_case("UP"))
    }

    /// Fold a probe verdict into the record. An active slowness cooldown
    /// dominates: the record stays unhealthy and the cooldown fields are
    /// untouched until the clock runs out, after which the next verdict
    /// applies normally.
    fn apply_probe_result(
        &self,
        server: &Arc<BackendHealth>,
        is_healthy: bool,
        response_time_ms: u64,
    ) {
        let cooldown = self.config.slowness_cooldown_seconds;
        let was_healthy = server.is_healthy();

        if server.still_in_slow_cooldown(cooldown) {
            tracing::debug!(
                "Server {} still in slowness cooldown, keeping unhealthy",
                server.url()
            );
            server.set_healthy(false);
            server.touch_health_check();
            return;
        }

        if server.is_in_slow_cooldown() {
            server.clear_slow_cooldown();
            tracing::info!(
                "Server {} slowness cooldown expired, can become healthy again",
                server.url()
            );
        }

        // Probe latencies are administrative; they never feed the
        // response-time window or the latency average.
        server.set_healthy(is_healthy);
        server.touch_health_check();

        let is_now_healthy = server.is_healthy();
        if was_healthy != is_now_healthy {
            tracing::info!(
                "Server {} health changed: {} -> {} (response time: {}ms)",
                server.url(),
                if was_healthy { "UP" } else { "DOWN" },
                if is_now_healthy { "UP" } else { "DOWN" },
                response_time_ms,
            );
        } else {
            tracing::debug!(
                "Server {} health check: {} (response time: {}ms)",
                server.url(),
                if is_now_healthy { "UP" } else { "DOWN" },
                response_time_ms,
            );
        }
    }

    /// Stop the background loop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl Drop for HealthChecker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
