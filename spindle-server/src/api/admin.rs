//! Admin inspection handlers.

use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Serialize;

use spindle_core::health::BackendStatus;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(get_server_health))
        .route("/strategy", get(get_strategy))
        .route("/stats", get(get_stats))
        .route("/discovery", get(get_discovery_info))
}

/// Per-backend health projections.
pub(crate) async fn get_server_health(State(state): State<AppState>) -> Json<Vec<BackendStatus>> {
    let statuses = state
        .registry
        .all_snapshot()
        .iter()
        .map(|server| server.status())
        .collect();
    Json(statuses)
}

#[derive(Debug, Serialize)]
pub(crate) struct StrategyResponse {
    pub strategy: String,
}

pub(crate) async fn get_strategy(State(state): State<AppState>) -> Json<StrategyResponse> {
    Json(StrategyResponse {
        strategy: state.strategy.name().to_string(),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatsResponse {
    pub total_servers: usize,
    pub healthy_servers: usize,
    pub unhealthy_servers: usize,
    /// Rounded mean of the per-backend latency averages across healthy
    /// records; 0 when none are healthy.
    pub average_response_time: u64,
    pub strategy: String,
}

pub(crate) async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let servers = state.registry.all_snapshot();
    let total_servers = servers.len();

    let healthy: Vec<_> = servers.iter().filter(|server| server.is_healthy()).collect();
    let healthy_servers = healthy.len();

    let average_response_time = if healthy.is_empty() {
        0
    } else {
        let sum: u64 = healthy.iter().map(|server| server.average_response_time()).sum();
        ((sum as f64) / (healthy_servers as f64)).round() as u64
    };

    Json(StatsResponse {
        total_servers,
        healthy_servers,
        unhealthy_servers: total_servers - healthy_servers,
        average_response_time,
        strategy: state.strategy.name().to_string(),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DiscoveryInfoResponse {
    pub strategy_name: String,
    pub supports_dynamic_updates: bool,
    pub discovered_servers: Vec<String>,
    pub server_count: usize,
}

pub(crate) async fn get_discovery_info(
    State(state): State<AppState>,
) -> Json<DiscoveryInfoResponse> {
    let discovered_servers = state.discovery.servers();
    Json(DiscoveryInfoResponse {
        strategy_name: state.discovery.name().to_string(),
        supports_dynamic_updates: state.discovery.supports_dynamic_updates(),
        server_count: discovered_servers.len(),
        discovered_servers,
    })
}
