//! Request forwarding.
//!
//! One forward call runs the full pick → send → classify → record loop:
//! select a backend from a fresh healthy snapshot, proxy the request,
//! record the observed latency, and on transport failure mark the backend
//! unhealthy and retry against the next one. Backends that *respond* with
//! an error status are never evicted or retried.

mod engine;


pub use engine::{ForwardingEngine, ProxyRequest, ProxyResponse};
