//! Helpers for handler-level tests.

use std::sync::Arc;

use spindle_core::forward::ForwardingEngine;
use spindle_core::health::ServerRegistry;
use spindle_core::{discovery, strategy, BalancerConfig};

use crate::state::AppState;

/// Build an `AppState` over a static pool without starting any listener
/// or background task.
pub fn test_app_state(servers: Vec<&str>) -> AppState {
    let config = Arc::new(BalancerConfig {
        servers: servers.into_iter().map(String::from).collect(),
        ..Default::default()
    });

    let discovery = discovery::from_config(&config);
    let strategy = strategy::from_config(&config);
    let registry = Arc::new(ServerRegistry::new(Arc::clone(&discovery), Arc::clone(&config)));
    registry.reconcile();

    let engine = Arc::new(
        ForwardingEngine::new(Arc::clone(&registry), Arc::clone(&strategy), &config).unwrap(),
    );

    AppState {
        registry,
        strategy,
        discovery,
        engine,
    }
}
