//! HTTP route table.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::relay::relay_handler;
use crate::state::AppState;

/// Build the relay router: the WebSocket endpoint plus a liveness probe.
pub fn create_relay_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/relay", get(relay_handler))
        .route("/healthz", get(health_check))
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> &'static str {
    "ok"
}
