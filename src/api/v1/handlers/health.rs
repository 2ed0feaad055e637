/*
 * Responsibility
 * - GET /health (疎通用、認証なし)
 * - GET /health/db (UserStore 経由で DB まで到達できるか)
 */
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use serde_json::json;

use crate::state::AppState;

const SERVICE_NAME: &str = "API Mantenimiento de Equipos - Continental SLP";

pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "OK",
            "timestamp": Utc::now(),
            "service": SERVICE_NAME,
        })),
    )
}

pub async fn health_db(State(state): State<AppState>) -> impl IntoResponse {
    match state.users.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({"status": "OK", "database": "Conectado", "timestamp": Utc::now()})),
        ),
        Err(e) => {
            tracing::error!(error = %e, "database health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "Error",
                    "database": "Sin conexión",
                    "timestamp": Utc::now(),
                })),
            )
        }
    }
}
