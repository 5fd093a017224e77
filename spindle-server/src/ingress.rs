//! Catch-all forwarding handler.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use http::header::{CONNECTION, TRANSFER_ENCODING};

use spindle_core::forward::{ProxyRequest, ProxyResponse};

use crate::state::AppState;

/// Forward one inbound request through the engine.
///
/// Administrative paths that did not match a real admin route never reach
/// the backends or the registry.
pub async fn forward(State(state): State<AppState>, request: Request) -> Response {
    let path = request.uri().path().to_string();
    if path.starts_with("/admin/") {
        return StatusCode::NOT_FOUND.into_response();
    }

    let method = request.method().clone();
    let headers = request.headers().clone();
    let query_params = parse_query_pairs(request.uri().query());

    let body = match axum::body::to_bytes(request.into_body(), usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Failed to read request body for {}: {}", path, e);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };
    let body = if body.is_empty() { None } else { Some(body) };

    let proxied = state
        .engine
        .forward(ProxyRequest {
            path,
            method,
            headers,
            query_params,
            body,
        })
        .await;

    into_response(proxied)
}

/// Split the raw query on `&` and `=` without any decoding, preserving
/// input order; a key with no `=` becomes an empty-valued pair.
fn parse_query_pairs(query: Option<&str>) -> Vec<(String, String)> {
    let Some(query) = query else {
        return Vec::new();
    };

    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

fn into_response(proxied: ProxyResponse) -> Response {
    let mut response = Response::new(Body::from(proxied.body));
    *response.status_mut() = proxied.status;

    let headers = response.headers_mut();
    for (name, value) in &proxied.headers {
        // The body was buffered in full; framing headers no longer apply.
        if name == TRANSFER_ENCODING || name == CONNECTION {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    response
}
