//! Health check endpoint for liveness probes.

use axum::extract::State;
use axum::http::StatusCode;

use super::AppState;

/// Returns 200 `OK` while events are accepted, 503 once shutdown has begun.
pub async fn health_handler(State(app_state): State<AppState>) -> (StatusCode, &'static str) {
    if app_state.queue().is_closed() {
        (StatusCode::SERVICE_UNAVAILABLE, "Shutting down")
    } else {
        (StatusCode::OK, "OK")
    }
}
