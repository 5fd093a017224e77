use axum::extract::State;

use super::admin::{get_discovery_info, get_server_health, get_stats, get_strategy};
use crate::test_helpers::test_app_state;

#[tokio::test]
async fn health_lists_every_tracked_backend() {
    let state = test_app_state(vec!["http://h:8081", "http://h:8082"]);
    let axum::Json(statuses) = get_server_health(State(state)).await;
    assert_eq!(statuses.len(), 2);
    assert!(statuses.iter().all(|status| status.healthy));
    assert!(statuses.iter().all(|status| status.average_response_time == 200));
}

#[tokio::test]
async fn health_reflects_unhealthy_backends() {
    let state = test_app_state(vec!["http://h:8081", "http://h:8082"]);
    state.registry.mark_unhealthy("http://h:8082", "test");

    let axum::Json(statuses) = get_server_health(State(state)).await;
    let down = statuses.iter().find(|s| s.url == "http://h:8082").unwrap();
    assert!(!down.healthy);
    assert_eq!(down.consecutive_failures, 1);
}

#[tokio::test]
async fn strategy_endpoint_names_the_active_strategy() {
    let state = test_app_state(vec![]);
    let axum::Json(response) = get_strategy(State(state)).await;
    assert_eq!(response.strategy, "Round Robin");
}

#[tokio::test]
async fn stats_on_empty_pool_are_all_zero() {
    let state = test_app_state(vec![]);
    let axum::Json(stats) = get_stats(State(state)).await;
    assert_eq!(stats.total_servers, 0);
    assert_eq!(stats.healthy_servers, 0);
    assert_eq!(stats.unhealthy_servers, 0);
    assert_eq!(stats.average_response_time, 0);
}

#[tokio::test]
async fn stats_average_covers_healthy_records_only() {
    let state = test_app_state(vec!["http://h:8081", "http://h:8082"]);

    // Pull one backend's average down, then take it out of rotation.
    for _ in 0..50 {
        state.registry.record_latency("http://h:8082", 1);
    }
    state.registry.mark_unhealthy("http://h:8082", "test");

    let axum::Json(stats) = get_stats(State(state)).await;
    assert_eq!(stats.total_servers, 2);
    assert_eq!(stats.healthy_servers, 1);
    assert_eq!(stats.unhealthy_servers, 1);
    // Only the untouched healthy backend contributes its seeded 200ms.
    assert_eq!(stats.average_response_time, 200);
    assert_eq!(stats.strategy, "Round Robin");
}

#[tokio::test]
async fn discovery_endpoint_reports_the_source() {
    let state = test_app_state(vec!["http://h:8081"]);
    let axum::Json(info) = get_discovery_info(State(state)).await;
    assert_eq!(info.strategy_name, "Static Configuration");
    assert!(!info.supports_dynamic_updates);
    assert_eq!(info.discovered_servers, vec!["http://h:8081".to_string()]);
    assert_eq!(info.server_count, 1);
}
