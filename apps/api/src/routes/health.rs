//! Health check HTTP route handlers
//!
//! - `GET /health` - Simple status check
//! - `GET /health/live` - Kubernetes-style liveness probe

use axum::{response::IntoResponse, routing::get, Json, Router};

/// Create health check router
pub fn health_router() -> Router {
    Router::new()
        .route("/", get(health_status))
        .route("/live", get(liveness_probe))
}

/// Simple status check for load balancers
async fn health_status() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "UP",
    }))
}

/// Liveness probe for Kubernetes
///
/// Returns 200 if the server process is running; external dependencies
/// are deliberately not consulted here.
async fn liveness_probe() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
