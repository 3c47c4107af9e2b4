//! Health check endpoint

use axum::{Router, routing::get};
use serde::Serialize;

use crate::core::ServerState;
use shared::ApiResponse;

#[derive(Serialize)]
pub struct HealthInfo {
    status: &'static str,
    version: &'static str,
    timestamp: String,
}

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/health", get(health))
}

/// GET /api/health - public liveness check
async fn health() -> ApiResponse<HealthInfo> {
    ApiResponse::success(HealthInfo {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
