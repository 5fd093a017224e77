//! Registry of tracked backends.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::BalancerConfig;
use crate::discovery::ServerDiscovery;
use crate::health::record::BackendHealth;

/// Reconciles the discovery source's URL set into health records and hands
/// out immutable snapshots.
///
/// The map is guarded by a reader/writer lock: reconciliation mutates under
/// the write lock (held only for map insertions/removals, never for I/O),
/// everything else reads through snapshot copies, so no caller ever
/// observes the map resizing.
pub struct ServerRegistry {
    servers: RwLock<HashMap<String, Arc<BackendHealth>>>,
    discovery: Arc<dyn ServerDiscovery>,
    config: Arc<BalancerConfig>,
}

impl ServerRegistry {
    pub fn new(discovery: Arc<dyn ServerDiscovery>, config: Arc<BalancerConfig>) -> Self {
        Self {
            servers: RwLock::new(HashMap::new()),
            discovery,
            config,
        }
    }

    pub fn discovery(&self) -> &Arc<dyn ServerDiscovery> {
        &self.discovery
    }

    /// Pull the current URL set from discovery and fold it into the map:
    /// unseen URLs get fresh records; for dynamic sources, records whose
    /// URL disappeared are dropped.
    pub fn reconcile(&self) {
        // Discovery may touch the filesystem; do it before taking the lock.
        let current = self.discovery.servers();
        let dynamic = self.discovery.supports_dynamic_updates();

        let mut servers = self.write();

        for url in &current {
            if !servers.contains_key(url) {
                servers.insert(
                    url.clone(),
                    Arc::new(BackendHealth::new(
                        url.clone(),
                        self.config.initial_latency_ms,
                        self.config.slowness_window_time_ms,
                        self.config.slowness_window_size,
                    )),
                );
                tracing::info!("Initialized health tracking for server: {}", url);
            }
        }

        if dynamic {
            servers.retain(|url, _| {
                let keep = current.contains(url);
                if !keep {
                    tracing::info!("Removed server from health tracking: {}", url);
                }
                keep
            });
        }
    }

    /// Immutable list of records selectable for routing right now:
    /// healthy and not inside an active slowness cooldown.
    pub fn healthy_snapshot(&self) -> Vec<Arc<BackendHealth>> {
        let cooldown = self.config.slowness_cooldown_seconds;
        self.read()
            .values()
            .filter(|server| server.is_healthy() && !server.still_in_slow_cooldown(cooldown))
            .cloned()
            .collect()
    }

    /// Immutable list of every tracked record.
    pub fn all_snapshot(&self) -> Vec<Arc<BackendHealth>> {
        self.read().values().cloned().collect()
    }

    pub fn get(&self, url: &str) -> Option<Arc<BackendHealth>> {
        self.read().get(url).cloned()
    }

    /// Take a backend out of rotation. No-op if the URL is untracked.
    pub fn mark_unhealthy(&self, url: &str, reason: &str) {
        if let Some(server) = self.get(url) {
            server.set_healthy(false);
            tracing::warn!("Marked server {} as unhealthy: {}", url, reason);
        }
    }

    /// Apply one user-request latency observation, and trip the slowness
    /// cooldown when the window says the backend is persistently slow.
    /// No-op if the URL is untracked.
    pub fn record_latency(&self, url: &str, latency_ms: u64) {
        let Some(server) = self.get(url) else {
            return;
        };

        server.record_response_time(latency_ms);

        let should_mark = server.should_be_marked_slow(
            self.config.slow_threshold_ms,
            self.config.slowness_threshold_ratio,
            self.config.slowness_window_size,
        );

        if should_mark && !server.is_in_slow_cooldown() {
            server.mark_slow();
            tracing::warn!(
                "Server {} marked as slow: {:.1}% of {} responses exceeded {}ms \
                 (window avg: {:.1}ms), applying {}s cooldown",
                url,
                server.slow_ratio(self.config.slow_threshold_ms) * 100.0,
                server.window_entry_count(),
                self.config.slow_threshold_ms,
                server.window_average(),
                self.config.slowness_cooldown_seconds,
            );
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<BackendHealth>>> {
        self.servers.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<BackendHealth>>> {
        self.servers.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
