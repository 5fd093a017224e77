//! Per-backend health state.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::window::ResponseTimeWindow;

#[derive(Debug)]
struct HealthState {
    healthy: bool,
    ema_latency_ms: u64,
    consecutive_failures: u32,
    last_health_check: SystemTime,
    last_slow: Option<Instant>,
    in_slow_cooldown: bool,
}

/// Health record for a single backend.
///
/// The scalar fields live under one `RwLock` so transitions that touch
/// several of them (`mark_slow` writes three) are a single critical
/// section; the response-time window carries its own lock.
///
/// Invariants: `in_slow_cooldown` implies `!healthy`, and `last_slow` is
/// `Some` exactly while `in_slow_cooldown` holds.
#[derive(Debug)]
pub struct BackendHealth {
    url: String,
    window: ResponseTimeWindow,
    state: RwLock<HealthState>,
}

impl BackendHealth {
    /// A new record is born healthy, with the latency average seeded at
    /// `initial_latency_ms` and an empty window.
    pub fn new(url: String, initial_latency_ms: u64, window_ms: u64, max_entries: usize) -> Self {
        Self {
            url,
            window: ResponseTimeWindow::new(window_ms, max_entries),
            state: RwLock::new(HealthState {
                healthy: true,
                ema_latency_ms: initial_latency_ms,
                consecutive_failures: 0,
                last_health_check: SystemTime::now(),
                last_slow: None,
                in_slow_cooldown: false,
            }),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_healthy(&self) -> bool {
        self.read().healthy
    }

    /// Assert a health verdict. Every unhealthy assertion bumps the
    /// consecutive-failure counter; a healthy one resets it.
    pub fn set_healthy(&self, healthy: bool) {
        let mut state = self.write();
        state.healthy = healthy;
        if healthy {
            state.consecutive_failures = 0;
        } else {
            state.consecutive_failures += 1;
        }
    }

    /// Smoothed latency signal used by the least-response-time strategy.
    pub fn average_response_time(&self) -> u64 {
        self.read().ema_latency_ms
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.read().consecutive_failures
    }

    /// Feed one user-request latency sample: into the sliding window, and
    /// into the weighted moving average (80% old, 20% new).
    pub fn record_response_time(&self, latency_ms: u64) {
        self.window.record(latency_ms);

        let mut state = self.write();
        state.ema_latency_ms = (state.ema_latency_ms * 4 + latency_ms) / 5;
    }

    /// Whether the recent response pattern qualifies as slow: enough
    /// samples in the window, and the slow fraction at or above the
    /// configured ratio.
    pub fn should_be_marked_slow(
        &self,
        slow_threshold_ms: u64,
        threshold_ratio: f64,
        minimum_entries: usize,
    ) -> bool {
        if !self.window.has_enough_data(minimum_entries) {
            return false;
        }
        self.window.slow_ratio(slow_threshold_ms) >= threshold_ratio
    }

    /// Put this backend into slowness cooldown and out of rotation.
    pub fn mark_slow(&self) {
        let mut state = self.write();
        state.last_slow = Some(Instant::now());
        state.in_slow_cooldown = true;
        state.healthy = false;
    }

    pub fn is_in_slow_cooldown(&self) -> bool {
        self.read().in_slow_cooldown
    }

    /// True while the cooldown clock is still running.
    pub fn still_in_slow_cooldown(&self, cooldown_seconds: u64) -> bool {
        let state = self.read();
        if !state.in_slow_cooldown {
            return false;
        }
        match state.last_slow {
            Some(marked_at) => marked_at.elapsed() < Duration::from_secs(cooldown_seconds),
            None => false,
        }
    }

    /// Leave cooldown so the next healthy probe can restore rotation.
    /// Idempotent.
    pub fn clear_slow_cooldown(&self) {
        let mut state = self.write();
        state.in_slow_cooldown = false;
        state.last_slow = None;
    }

    pub fn touch_health_check(&self) {
        self.write().last_health_check = SystemTime::now();
    }

    pub fn last_health_check_unix(&self) -> u64 {
        self.read()
            .last_health_check
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    /// Window-level introspection, surfaced in slowness log lines.
    pub fn window_average(&self) -> f64 {
        self.window.average()
    }

    pub fn window_entry_count(&self) -> usize {
        self.window.entry_count()
    }

    pub fn slow_ratio(&self, slow_threshold_ms: u64) -> f64 {
        self.window.slow_ratio(slow_threshold_ms)
    }

    /// Immutable projection for the admin surface.
    pub fn status(&self) -> BackendStatus {
        let state = self.read();
        BackendStatus {
            url: self.url.clone(),
            healthy: state.healthy,
            average_response_time: state.ema_latency_ms,
            last_health_check: state
                .last_health_check
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            consecutive_failures: state.consecutive_failures,
            in_slow_cooldown: state.in_slow_cooldown,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HealthState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HealthState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Serialized view of one backend record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendStatus {
    pub url: String,
    pub healthy: bool,
    pub average_response_time: u64,
    /// Unix seconds of the most recent probe application.
    pub last_health_check: u64,
    pub consecutive_failures: u32,
    pub in_slow_cooldown: bool,
}
