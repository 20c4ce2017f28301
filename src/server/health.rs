//! Liveness endpoint.

use axum::http::StatusCode;

/// Returns 200 "OK" whenever the server is accepting connections; wired to
/// orchestration liveness probes.
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
