//! Selection by lowest smoothed latency.

use std::sync::Arc;

use super::LoadBalancingStrategy;
use crate::health::BackendHealth;

/// Linear scan for the minimum latency average among still-healthy
/// records; ties resolve to the first encountered.
pub struct LeastResponseTime;

impl LoadBalancingStrategy for LeastResponseTime {
    fn select(&self, healthy_servers: &[Arc<BackendHealth>]) -> Option<Arc<BackendHealth>> {
        let mut best: Option<&Arc<BackendHealth>> = None;
        let mut best_response_time = u64::MAX;

        for server in healthy_servers {
            if server.is_healthy() {
                let response_time = server.average_response_time();
                if response_time < best_response_time {
                    best_response_time = response_time;
                    best = Some(server);
                }
            }
        }

        best.cloned()
    }

    fn name(&self) -> &str {
        "Least Response Time"
    }
}
