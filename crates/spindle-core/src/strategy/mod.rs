//! Backend selection strategies.

use std::sync::Arc;

use crate::config::BalancerConfig;
use crate::health::BackendHealth;

mod least_response_time;
mod round_robin;

#[cfg(test)]
mod tests;

pub use least_response_time::LeastResponseTime;
pub use round_robin::RoundRobin;

/// Pure selection over a caller-provided snapshot. Implementations hold no
/// state beyond an optional rotation counter.
pub trait LoadBalancingStrategy: Send + Sync {
    /// Pick the next backend, or `None` when the snapshot is empty or no
    /// candidate survives the defensive health re-check.
    fn select(&self, healthy_servers: &[Arc<BackendHealth>]) -> Option<Arc<BackendHealth>>;

    /// Human-readable name of this strategy.
    fn name(&self) -> &str;
}

/// Pick the strategy named by the config; unknown names fall back to
/// round-robin.
pub fn from_config(config: &BalancerConfig) -> Arc<dyn LoadBalancingStrategy> {
    match config.strategy.to_lowercase().as_str() {
        "least-response-time" => Arc::new(LeastResponseTime),
        "round-robin" => Arc::new(RoundRobin::new()),
        other => {
            tracing::warn!("Unknown strategy '{}', falling back to round-robin", other);
            Arc::new(RoundRobin::new())
        }
    }
}
