use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    status: &'static str,
    client_id: String,
    provider: &'static str,
}

/// Readiness check endpoint
///
/// Ready once the provider configuration can be loaded.
pub async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let configuration = state
        .handler
        .options()
        .configuration_manager
        .get_configuration()
        .await;

    let (status, ready, provider) = match configuration {
        Ok(_) => (StatusCode::OK, "ready", "reachable"),
        Err(e) => {
            tracing::warn!(error = %e, "Provider configuration not available");
            (StatusCode::SERVICE_UNAVAILABLE, "not_ready", "unreachable")
        }
    };

    (
        status,
        Json(ReadinessResponse {
            status: ready,
            client_id: state.config.client_id.clone(),
            provider,
        }),
    )
}
