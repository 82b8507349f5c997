//! Liveness endpoint.

use axum::Json;
use serde::Serialize;

/// Body of `GET /health`.
///
/// Liveness only; neither the cache directory nor the upstream is checked.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self { status: "UP" }
    }
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}
