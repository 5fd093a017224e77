use std::collections::HashMap;
use std::sync::Arc;

use crate::config::BalancerConfig;
use crate::health::BackendHealth;
use crate::strategy::{self, LeastResponseTime, LoadBalancingStrategy, RoundRobin};

fn record(url: &str, initial_latency_ms: u64) -> Arc<BackendHealth> {
    Arc::new(BackendHealth::new(url.to_string(), initial_latency_ms, 30_000, 5))
}

#[test]
fn round_robin_empty_snapshot_yields_none() {
    let strategy = RoundRobin::new();
    assert!(strategy.select(&[]).is_none());
}

#[test]
fn round_robin_distributes_evenly() {
    let strategy = RoundRobin::new();
    let servers = vec![record("http://h:1", 200), record("http://h:2", 200), record("http://h:3", 200)];

    let mut picks: HashMap<String, usize> = HashMap::new();
    for _ in 0..30 {
        let selected = strategy.select(&servers).unwrap();
        *picks.entry(selected.url().to_string()).or_default() += 1;
    }

    assert_eq!(picks.len(), 3);
    for count in picks.values() {
        assert_eq!(*count, 10);
    }
}

#[test]
fn round_robin_starts_at_the_first_server_and_alternates() {
    let strategy = RoundRobin::new();
    let servers = vec![record("http://h:1", 200), record("http://h:2", 200)];

    let order: Vec<String> = (0..4)
        .map(|_| strategy.select(&servers).unwrap().url().to_string())
        .collect();
    assert_eq!(order, vec!["http://h:1", "http://h:2", "http://h:1", "http://h:2"]);
}

#[test]
fn round_robin_skips_servers_gone_unhealthy_since_snapshot() {
    let strategy = RoundRobin::new();
    let servers = vec![record("http://h:1", 200), record("http://h:2", 200)];
    servers[0].set_healthy(false);

    for _ in 0..4 {
        let selected = strategy.select(&servers).unwrap();
        assert_eq!(selected.url(), "http://h:2");
    }
}

#[test]
fn round_robin_all_unhealthy_yields_none() {
    let strategy = RoundRobin::new();
    let servers = vec![record("http://h:1", 200), record("http://h:2", 200)];
    servers[0].set_healthy(false);
    servers[1].set_healthy(false);
    assert!(strategy.select(&servers).is_none());
}

#[test]
fn least_response_time_picks_the_minimum_average() {
    let strategy = LeastResponseTime;
    let servers = vec![
        record("http://h:1", 300),
        record("http://h:2", 100),
        record("http://h:3", 200),
    ];
    assert_eq!(strategy.select(&servers).unwrap().url(), "http://h:2");
}

#[test]
fn least_response_time_ties_resolve_to_first_encountered() {
    let strategy = LeastResponseTime;
    let servers = vec![
        record("http://h:1", 100),
        record("http://h:2", 100),
        record("http://h:3", 100),
    ];
    assert_eq!(strategy.select(&servers).unwrap().url(), "http://h:1");
}

#[test]
fn least_response_time_ignores_unhealthy_records() {
    let strategy = LeastResponseTime;
    let servers = vec![record("http://h:1", 100), record("http://h:2", 500)];
    servers[0].set_healthy(false);
    assert_eq!(strategy.select(&servers).unwrap().url(), "http://h:2");
}

#[test]
fn least_response_time_empty_or_all_unhealthy_yields_none() {
    let strategy = LeastResponseTime;
    assert!(strategy.select(&[]).is_none());

    let servers = vec![record("http://h:1", 100)];
    servers[0].set_healthy(false);
    assert!(strategy.select(&servers).is_none());
}

#[test]
fn least_response_time_follows_the_moving_average() {
    let strategy = LeastResponseTime;
    let servers = vec![record("http://h:1", 100), record("http://h:2", 200)];

    // Drive the first server's average well above the second's.
    for _ in 0..10 {
        servers[0].record_response_time(900);
    }
    assert_eq!(strategy.select(&servers).unwrap().url(), "http://h:2");
}

#[test]
fn factory_selects_by_name_with_round_robin_fallback() {
    let config = BalancerConfig {
        strategy: "least-response-time".to_string(),
        ..Default::default()
    };
    assert_eq!(strategy::from_config(&config).name(), "Least Response Time");

    let config = BalancerConfig {
        strategy: "round-robin".to_string(),
        ..Default::default()
    };
    assert_eq!(strategy::from_config(&config).name(), "Round Robin");

    let config = BalancerConfig {
        strategy: "weighted".to_string(),
        ..Default::default()
    };
    assert_eq!(strategy::from_config(&config).name(), "Round Robin");
}
