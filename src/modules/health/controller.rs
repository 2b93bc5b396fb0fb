use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct PingResponse {
    pub message: &'static str,
    pub status: &'static str,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DatabaseHealth {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub time: DateTime<Utc>,
    pub database: DatabaseHealth,
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/ping",
    responses((status = 200, description = "Process is up", body = PingResponse)),
    tag = "Health"
)]
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        message: "pong",
        status: "ok",
        time: Utc::now(),
    })
}

/// Readiness probe, including a store round trip
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Healthy", body = HealthResponse),
        (status = 503, description = "Store unreachable", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (code, status, database) = match state.store().ping().await {
        Ok(()) => (
            StatusCode::OK,
            "ok",
            DatabaseHealth {
                status: "connected",
                error: None,
            },
        ),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "degraded",
                DatabaseHealth {
                    status: "disconnected",
                    error: Some(e.to_string()),
                },
            )
        }
    };

    (
        code,
        Json(HealthResponse {
            status,
            time: Utc::now(),
            database,
        }),
    )
}
