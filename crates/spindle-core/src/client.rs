//! Shared HTTP client construction.

use std::time::Duration;

use crate::error::CoreResult;

/// Build an outbound HTTP client with a whole-request timeout.
///
/// Used for both user-request forwarding and health probes; the two get
/// separate clients because their timeouts differ.
pub fn build_http_client(timeout_secs: u64) -> CoreResult<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .tcp_nodelay(true)
        .build()?;

    Ok(client)
}
