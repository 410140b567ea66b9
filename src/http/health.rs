//! Liveness and catch-all routes.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::http::server::AppState;

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "ts": Utc::now().timestamp_millis(),
        "env": state.environment.as_ref(),
    }))
}

/// `GET /`
pub async fn root() -> Json<Value> {
    Json(json!({
        "status": "OK",
        "message": "Snap API is running",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

/// Fallback for unknown routes.
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}
