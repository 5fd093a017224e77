//! Backend health tracking.
//!
//! - [`BackendHealth`]: per-backend record (health flag, latency average,
//!   sliding window, cooldown state)
//! - [`ServerRegistry`]: URL-keyed record map under a reader/writer lock,
//!   reconciled against the discovery source
//! - [`HealthChecker`]: periodic prober applying verdicts with cooldown
//!   dominance

mod checker;
mod record;
mod registry;


pub use checker::HealthChecker;
pub use record::{BackendHealth, BackendStatus};
pub use registry::ServerRegistry;
