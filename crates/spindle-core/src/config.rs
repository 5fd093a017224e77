//! Balancer configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Runtime configuration for the balancer.
///
/// Keys are camelCase in the JSON file. Every field has a default, so an
/// absent config file yields a fully usable (if backend-less) instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancerConfig {
    /// Address the listener binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port the listener binds to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Static backend URL list (used when discovery is `static`).
    #[serde(default)]
    pub servers: Vec<String>,

    /// `static` or `file`; anything else falls back to static.
    #[serde(default = "default_discovery_strategy")]
    pub server_discovery_strategy: String,

    /// File path for the `file` discovery strategy.
    #[serde(default = "default_discovery_file_path")]
    pub server_discovery_file_path: String,

    /// Period between health-checker ticks.
    #[serde(default = "default_health_check_interval_ms")]
    pub health_check_interval_ms: u64,

    /// Per-probe timeout.
    #[serde(default = "default_health_check_timeout_seconds")]
    pub health_check_timeout_seconds: u64,

    /// Per-forward timeout.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// Latency above this counts as a slow sample.
    #[serde(default = "default_slow_threshold_ms")]
    pub slow_threshold_ms: u64,

    /// Window capacity, and the minimum sample count before slowness may fire.
    #[serde(default = "default_slowness_window_size")]
    pub slowness_window_size: usize,

    /// Time horizon of the response-time window.
    #[serde(default = "default_slowness_window_time_ms")]
    pub slowness_window_time_ms: u64,

    /// Slow-sample fraction that triggers cooldown.
    #[serde(default = "default_slowness_threshold_ratio")]
    pub slowness_threshold_ratio: f64,

    /// Cooldown duration for a backend marked slow.
    #[serde(default = "default_slowness_cooldown_seconds")]
    pub slowness_cooldown_seconds: u64,

    /// Seed value for a new backend's latency average.
    #[serde(default = "default_initial_latency_ms")]
    pub initial_latency_ms: u64,

    /// `round-robin` or `least-response-time`.
    #[serde(default = "default_strategy")]
    pub strategy: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_discovery_strategy() -> String {
    "static".to_string()
}

fn default_discovery_file_path() -> String {
    "servers.txt".to_string()
}

fn default_health_check_interval_ms() -> u64 {
    10_000
}

fn default_health_check_timeout_seconds() -> u64 {
    3
}

fn default_request_timeout_seconds() -> u64 {
    5
}

fn default_slow_threshold_ms() -> u64 {
    1_000
}

fn default_slowness_window_size() -> usize {
    5
}

fn default_slowness_window_time_ms() -> u64 {
    30_000
}

fn default_slowness_threshold_ratio() -> f64 {
    0.6
}

fn default_slowness_cooldown_seconds() -> u64 {
    60
}

fn default_initial_latency_ms() -> u64 {
    200
}

fn default_strategy() -> String {
    "round-robin".to_string()
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            servers: Vec::new(),
            server_discovery_strategy: default_discovery_strategy(),
            server_discovery_file_path: default_discovery_file_path(),
            health_check_interval_ms: default_health_check_interval_ms(),
            health_check_timeout_seconds: default_health_check_timeout_seconds(),
            request_timeout_seconds: default_request_timeout_seconds(),
            slow_threshold_ms: default_slow_threshold_ms(),
            slowness_window_size: default_slowness_window_size(),
            slowness_window_time_ms: default_slowness_window_time_ms(),
            slowness_threshold_ratio: default_slowness_threshold_ratio(),
            slowness_cooldown_seconds: default_slowness_cooldown_seconds(),
            initial_latency_ms: default_initial_latency_ms(),
            strategy: default_strategy(),
        }
    }
}

impl BalancerConfig {
    /// Load configuration from a JSON file.
    ///
    /// A missing file is not an error: the balancer starts with defaults
    /// (an empty backend set routes every request to 503 until discovery
    /// supplies servers). A file that exists but fails to parse is a
    /// startup error.
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            tracing::warn!(
                "Config file {} not found, starting with defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| CoreError::Config(format!("failed to parse {}: {e}", path.display())))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = BalancerConfig::default();
        assert_eq!(config.port, 8080);
        assert!(config.servers.is_empty());
        assert_eq!(config.server_discovery_strategy, "static");
        assert_eq!(config.server_discovery_file_path, "servers.txt");
        assert_eq!(config.health_check_interval_ms, 10_000);
        assert_eq!(config.health_check_timeout_seconds, 3);
        assert_eq!(config.request_timeout_seconds, 5);
        assert_eq!(config.slow_threshold_ms, 1_000);
        assert_eq!(config.slowness_window_size, 5);
        assert_eq!(config.slowness_window_time_ms, 30_000);
        assert!((config.slowness_threshold_ratio - 0.6).abs() < f64::EPSILON);
        assert_eq!(config.slowness_cooldown_seconds, 60);
        assert_eq!(config.initial_latency_ms, 200);
        assert_eq!(config.strategy, "round-robin");
    }

    #[test]
    fn parses_camel_case_keys() {
        let json = r#"{
            "servers": ["http://localhost:8081", "http://localhost:8082"],
            "serverDiscoveryStrategy": "file",
            "serverDiscoveryFilePath": "backends.txt",
            "healthCheckIntervalMs": 2000,
            "slowThresholdMs": 300,
            "slownessThresholdRatio": 0.5,
            "strategy": "least-response-time"
        }"#;
        let config: BalancerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.servers.len(), 2);
        assert_eq!(config.server_discovery_strategy, "file");
        assert_eq!(config.server_discovery_file_path, "backends.txt");
        assert_eq!(config.health_check_interval_ms, 2000);
        assert_eq!(config.slow_threshold_ms, 300);
        assert!((config.slowness_threshold_ratio - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.strategy, "least-response-time");
        // Unspecified keys keep their defaults.
        assert_eq!(config.request_timeout_seconds, 5);
    }

    #[test]
    fn load_missing_file_yields_defaults() {
        let config = BalancerConfig::load(Path::new("/nonexistent/spindle.json")).unwrap();
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn load_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spindle.json");
        std::fs::write(&path, "{ not json").unwrap();
        let result = BalancerConfig::load(&path);
        assert!(matches!(result, Err(CoreError::Config(_))));
    }
}
