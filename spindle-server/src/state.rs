//! Shared application state.

use std::sync::Arc;

use spindle_core::discovery::ServerDiscovery;
use spindle_core::forward::ForwardingEngine;
use spindle_core::health::ServerRegistry;
use spindle_core::strategy::LoadBalancingStrategy;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ServerRegistry>,
    pub strategy: Arc<dyn LoadBalancingStrategy>,
    pub discovery: Arc<dyn ServerDiscovery>,
    pub engine: Arc<ForwardingEngine>,
}
