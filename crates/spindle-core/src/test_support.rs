//! Shared helpers for in-crate integration tests.

use axum::routing::get;
use axum::{Json, Router};

/// Bind an ephemeral port, serve `router` on it, and return the base URL.
pub async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// A backend exposing only `/actuator/health` with a fixed status value.
pub fn health_probe_router(status: &'static str) -> Router {
    Router::new().route(
        "/actuator/health",
        get(move || async move { Json(serde_json::json!({ "status": status })) }),
    )
}

/// A URL on a port nothing listens on; connections are refused.
pub fn unreachable_url() -> String {
    "http://127.0.0.1:1".to_string()
}
