//! Liveness and storage health

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tracing::warn;

use crate::shared_state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Language Learning API is running" }))
}

/// Pings the profile store.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.profiles.store().ping() {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                database: "connected",
                version: env!("CARGO_PKG_VERSION"),
                error: None,
            }),
        ),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthResponse {
                    status: "unhealthy",
                    database: "unavailable",
                    version: env!("CARGO_PKG_VERSION"),
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
