//! Health check handler

use axum::Json;
use serde::Serialize;

/// Public health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    /// Status indicator (always "ok")
    pub status: String,
}

/// GET /api/v1/health
///
/// Basic liveness endpoint; does not require authentication.
///
/// # Example
/// ```bash
/// curl http://localhost:8000/api/v1/health
/// # Returns: {"status":"ok"}
/// ```
pub async fn health_check() -> Json<HealthCheckResponse> {
    tracing::debug!(operation = "health_check", "Health check requested");
    Json(HealthCheckResponse {
        status: "ok".to_string(),
    })
}
