//! GET /health - liveness plus database connectivity

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde::Serialize;

use crate::api::middleware::AppState;
use crate::db::migrations;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub timestamp: String,
}

/// 200 when the store answers and its schema is current, 503 otherwise
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let database = match state.pool.ping().await {
        Ok(()) => match migrations::is_up_to_date(&state.pool).await {
            Ok(true) => "connected",
            Ok(false) => "migrations pending",
            Err(e) => {
                tracing::warn!("Health check could not read migrations: {:#}", e);
                "migrations pending"
            }
        },
        Err(e) => {
            tracing::warn!("Health check failed: {:#}", e);
            "disconnected"
        }
    };

    let (status_code, status) = if database == "connected" {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "error")
    };

    (
        status_code,
        Json(HealthResponse {
            status,
            database,
            timestamp: Utc::now().to_rfc3339(),
        }),
    )
}
