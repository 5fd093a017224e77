//! Router assembly.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::ingress;
use crate::state::AppState;

const MAX_BODY_BYTES: usize = 100 * 1024 * 1024;

/// `/admin` carries the read-only inspection surface; everything else
/// falls through to the forwarding handler.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/admin", api::router())
        .fallback(ingress::forward)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
