//! Rotating selection with a shared counter.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::LoadBalancingStrategy;
use crate::health::BackendHealth;

/// Classic round-robin. The counter is shared across concurrent calls and
/// advances atomically; distribution is even in expectation under
/// contention, exact when calls are sequential.
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self {
            counter: AtomicUsize::new(0),
        }
    }
}

impl Default for RoundRobin {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadBalancingStrategy for RoundRobin {
    fn select(&self, healthy_servers: &[Arc<BackendHealth>]) -> Option<Arc<BackendHealth>> {
        if healthy_servers.is_empty() {
            return None;
        }

        // The snapshot was filtered at capture time, but a backend may have
        // gone unhealthy since; re-check and try each slot at most once.
        let server_count = healthy_servers.len();
        for _ in 0..server_count {
            let index = self.counter.fetch_add(1, Ordering::Relaxed) % server_count;
            let selected = &healthy_servers[index];
            if selected.is_healthy() {
                return Some(Arc::clone(selected));
            }
        }

        None
    }

    fn name(&self) -> &str {
        "Round Robin"
    }
}
