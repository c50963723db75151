//! Per-request access log.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use tracing::{info, warn};

use crate::auth::Identity;

/// Log method, matched route, status, latency and the authenticated user, if any.
/// Raw paths and headers are not logged, so tokens in query strings or
/// cookies never reach the log.
pub async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "<unmatched>".to_string());
    let start = Instant::now();

    let response = next.run(request).await;

    let duration_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();
    let user_id = response.extensions().get::<Identity>().map(|i| i.id);

    if response.status().is_server_error() {
        warn!(%method, route = %route, status, duration_ms, user_id, "Request failed");
    } else {
        info!(%method, route = %route, status, duration_ms, user_id, "Request");
    }

    response
}
