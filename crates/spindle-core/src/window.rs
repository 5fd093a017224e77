//! Sliding window over observed response times.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct WindowEntry {
    latency_ms: u64,
    recorded_at: Instant,
}

#[derive(Debug, Default)]
struct WindowState {
    entries: VecDeque<WindowEntry>,
    total_ms: u64,
}

/// Time-and-count-bounded FIFO of latency samples.
///
/// The queue and its running sum live under one mutex, so the aggregates
/// can never drift from the entries, even with concurrent `record` calls
/// from request callbacks and reads from the selector or admin endpoints.
/// Eviction drops stale entries first (older than the time horizon), then
/// the oldest entries until the count bound holds.
#[derive(Debug)]
pub struct ResponseTimeWindow {
    state: Mutex<WindowState>,
    window_ms: u64,
    max_entries: usize,
}

impl ResponseTimeWindow {
    pub fn new(window_ms: u64, max_entries: usize) -> Self {
        Self {
            state: Mutex::new(WindowState::default()),
            window_ms,
            max_entries,
        }
    }

    /// Record a new latency sample stamped with the current time.
    pub fn record(&self, latency_ms: u64) {
        self.record_at(latency_ms, Instant::now());
    }

    fn record_at(&self, latency_ms: u64, now: Instant) {
        let mut state = self.lock();
        state.entries.push_back(WindowEntry {
            latency_ms,
            recorded_at: now,
        });
        state.total_ms += latency_ms;

        Self::evict_stale(&mut state, now, self.window_ms);

        while state.entries.len() > self.max_entries {
            if let Some(removed) = state.entries.pop_front() {
                state.total_ms -= removed.latency_ms;
            }
        }
    }

    /// Mean latency over the live entries; 0 when the window is empty.
    pub fn average(&self) -> f64 {
        let mut state = self.lock();
        Self::evict_stale(&mut state, Instant::now(), self.window_ms);
        if state.entries.is_empty() {
            return 0.0;
        }
        state.total_ms as f64 / state.entries.len() as f64
    }

    /// Fraction of live entries strictly above `slow_threshold_ms`;
    /// 0 when the window is empty.
    pub fn slow_ratio(&self, slow_threshold_ms: u64) -> f64 {
        let mut state = self.lock();
        Self::evict_stale(&mut state, Instant::now(), self.window_ms);
        if state.entries.is_empty() {
            return 0.0;
        }
        let slow = state
            .entries
            .iter()
            .filter(|entry| entry.latency_ms > slow_threshold_ms)
            .count();
        slow as f64 / state.entries.len() as f64
    }

    /// Number of live entries after pruning.
    pub fn entry_count(&self) -> usize {
        let mut state = self.lock();
        Self::evict_stale(&mut state, Instant::now(), self.window_ms);
        state.entries.len()
    }

    /// Whether the window holds enough samples for reliable analysis.
    /// Evaluated after pruning stale entries.
    pub fn has_enough_data(&self, minimum_entries: usize) -> bool {
        self.entry_count() >= minimum_entries
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.total_ms = 0;
    }

    fn evict_stale(state: &mut WindowState, now: Instant, window_ms: u64) {
        let Some(cutoff) = now.checked_sub(Duration::from_millis(window_ms)) else {
            // Process younger than the window: nothing can be stale.
            return;
        };

        while let Some(oldest) = state.entries.front() {
            if oldest.recorded_at < cutoff {
                if let Some(removed) = state.entries.pop_front() {
                    state.total_ms -= removed.latency_ms;
                }
            } else {
                break;
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, WindowState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
