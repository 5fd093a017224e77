//! The forwarding engine.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::header::{HeaderMap, CONTENT_LENGTH, HOST, TRANSFER_ENCODING};
use http::{Method, StatusCode};

use crate::client::build_http_client;
use crate::config::BalancerConfig;
use crate::error::CoreResult;
use crate::health::ServerRegistry;
use crate::strategy::LoadBalancingStrategy;

/// One inbound request, as handed over by the ingress.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    /// Original request path, appended verbatim to the backend URL.
    pub path: String,
    pub method: Method,
    pub headers: HeaderMap,
    /// Raw query pairs in input order; re-joined without any encoding.
    pub query_params: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

/// The response triple returned to the ingress.
#[derive(Debug)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ProxyResponse {
    fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::from(body.into()),
        }
    }
}

/// Proxies requests across the registry's healthy backends.
pub struct ForwardingEngine {
    registry: Arc<ServerRegistry>,
    strategy: Arc<dyn LoadBalancingStrategy>,
    client: reqwest::Client,
}

impl ForwardingEngine {
    pub fn new(
        registry: Arc<ServerRegistry>,
        strategy: Arc<dyn LoadBalancingStrategy>,
        config: &BalancerConfig,
    ) -> CoreResult<Self> {
        let client = build_http_client(config.request_timeout_seconds)?;
        Ok(Self {
            registry,
            strategy,
            client,
        })
    }

    /// Forward one request end-to-end. Never panics; every failure maps to
    /// a response.
    ///
    /// Each attempt observes a *fresh* healthy snapshot, and the attempt
    /// counter is bounded by that snapshot's length, so the retry loop
    /// terminates even while a concurrent probe flips health flags.
    pub async fn forward(&self, request: ProxyRequest) -> ProxyResponse {
        let mut attempt: usize = 0;

        loop {
            let healthy_servers = self.registry.healthy_snapshot();

            if attempt >= healthy_servers.len() {
                tracing::warn!(
                    "All servers exhausted after {} attempts for {}",
                    attempt,
                    request.path
                );
                return ProxyResponse::text(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "All backend servers are unavailable",
                );
            }

            let Some(selected) = self.strategy.select(&healthy_servers) else {
                tracing::warn!("No healthy servers available for {}", request.path);
                return ProxyResponse::text(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "No healthy servers available",
                );
            };

            let target_url = build_target_url(selected.url(), &request);
            tracing::debug!(
                "Forwarding {} {} to {}",
                request.method,
                request.path,
                target_url
            );

            let started = Instant::now();
            match self.execute(&target_url, &request).await {
                Ok(response) => {
                    let response_time = started.elapsed().as_millis() as u64;
                    self.registry.record_latency(selected.url(), response_time);
                    tracing::info!(
                        "✅ {} responded in {}ms for {} {}",
                        selected.url(),
                        response_time,
                        request.method,
                        request.path
                    );
                    return response;
                }
                Err(error) => {
                    let response_time = started.elapsed().as_millis() as u64;

                    if is_transport_error(&error) {
                        tracing::error!(
                            "❌ {} is unreachable after {}ms for {} {}: {}",
                            selected.url(),
                            response_time,
                            request.method,
                            request.path,
                            error
                        );
                        self.registry.mark_unhealthy(
                            selected.url(),
                            &format!("Server unreachable: {error}"),
                        );
                        attempt += 1;
                    } else {
                        // The backend answered with a status the client
                        // surfaced as an error: it is responding, so record
                        // the latency and hand the failure back without
                        // retrying.
                        tracing::warn!(
                            "⚠️ {} returned error after {}ms for {} {}: {}",
                            selected.url(),
                            response_time,
                            request.method,
                            request.path,
                            error
                        );
                        self.registry.record_latency(selected.url(), response_time);
                        return ProxyResponse::text(
                            StatusCode::BAD_GATEWAY,
                            format!("Backend server error: {error}"),
                        );
                    }
                }
            }
        }
    }

    async fn execute(
        &self,
        target_url: &str,
        request: &ProxyRequest,
    ) -> Result<ProxyResponse, reqwest::Error> {
        let mut builder = self
            .client
            .request(request.method.clone(), target_url)
            .headers(forwardable_headers(&request.headers));

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;

        // Surface 5xx as a status-carrying error: the backend is responding,
        // so the caller gets the gateway wrapping rather than the raw
        // failure, and the engine neither evicts nor retries. 4xx passes
        // through verbatim.
        if response.status().is_server_error() {
            if let Err(error) = response.error_for_status_ref() {
                return Err(error);
            }
        }

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(ProxyResponse {
            status,
            headers,
            body,
        })
    }
}

/// `chosen.url + path`, then `?k1=v1&k2=v2…` exactly as supplied by the
/// caller.
fn build_target_url(base_url: &str, request: &ProxyRequest) -> String {
    let mut url = format!("{}{}", base_url, request.path);

    if !request.query_params.is_empty() {
        url.push('?');
        for (key, value) in &request.query_params {
            url.push_str(key);
            url.push('=');
            url.push_str(value);
            url.push('&');
        }
        url.pop();
    }

    url
}

/// Everything passes through except the fields the outbound client must
/// own: `Host` tracks the chosen backend, and the framing headers are
/// recomputed for the buffered body.
fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = HeaderMap::new();
    for (name, value) in headers {
        if name == HOST || name == CONTENT_LENGTH || name == TRANSFER_ENCODING {
            continue;
        }
        forwarded.append(name.clone(), value.clone());
    }
    forwarded
}

/// Transport errors mean the server never answered: connection refused,
/// unresolved host, timeout with no status received, premature close mid
/// body. An error that carries an HTTP status is a response from a live
/// server and must not evict it. Anything unrecognized is treated as
/// transport, the conservative choice.
fn is_transport_error(error: &reqwest::Error) -> bool {
    error.status().is_none()
}

#[cfg(test)]
mod unit {
    use super::*;

    fn request_with_query(query_params: Vec<(&str, &str)>) -> ProxyRequest {
        ProxyRequest {
            path: "/api/info".to_string(),
            method: Method::GET,
            headers: HeaderMap::new(),
            query_params: query_params
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: None,
        }
    }

    #[test]
    fn target_url_without_query() {
        let url = build_target_url("http://h:8081", &request_with_query(vec![]));
        assert_eq!(url, "http://h:8081/api/info");
    }

    #[test]
    fn target_url_appends_query_pairs_in_order() {
        let url = build_target_url(
            "http://h:8081",
            &request_with_query(vec![("b", "2"), ("a", "1")]),
        );
        assert_eq!(url, "http://h:8081/api/info?b=2&a=1");
    }

    #[test]
    fn target_url_leaves_caller_encoding_untouched() {
        let url = build_target_url(
            "http://h:8081",
            &request_with_query(vec![("q", "a b"), ("v", "100%")]),
        );
        assert_eq!(url, "http://h:8081/api/info?q=a b&v=100%");
    }

    #[test]
    fn forwardable_headers_drop_host_and_framing() {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, "balancer.local".parse().unwrap());
        headers.insert(CONTENT_LENGTH, "12".parse().unwrap());
        headers.insert("x-request-id", "abc-123".parse().unwrap());
        let forwarded = forwardable_headers(&headers);
        assert!(forwarded.get(HOST).is_none());
        assert!(forwarded.get(CONTENT_LENGTH).is_none());
        assert_eq!(forwarded.get("x-request-id").unwrap(), "abc-123");
    }
}
