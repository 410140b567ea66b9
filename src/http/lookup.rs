//! Lookup route handlers.

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::Value;

use crate::http::server::AppState;
use crate::lookup::username::coerce_raw;
use crate::lookup::LookupMode;

/// POST body. Only `username` is read; anything else is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct LookupRequest {
    #[serde(default)]
    pub username: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LookupQuery {
    pub username: Option<String>,
}

/// `POST /lookup`: full pipeline with retries.
///
/// The body is parsed leniently: anything that is not a JSON object with a
/// usable `username` ends up as an `invalid_username` rejection.
pub async fn lookup_post(State(state): State<AppState>, body: Bytes) -> Response {
    let request: LookupRequest = serde_json::from_slice(&body).unwrap_or_default();
    let raw = coerce_raw(request.username.as_ref());

    match state.lookup.lookup(&raw, LookupMode::Full).await {
        Ok(outcome) => outcome.into_response(),
        Err(e) => e.into_response(),
    }
}

/// `GET /lookup?username=`: single attempt smoke check.
pub async fn lookup_get(
    State(state): State<AppState>,
    query: Result<Query<LookupQuery>, QueryRejection>,
) -> Response {
    let raw = query
        .ok()
        .and_then(|Query(q)| q.username)
        .unwrap_or_default();

    match state.lookup.lookup(&raw, LookupMode::SingleAttempt).await {
        Ok(outcome) => outcome.into_response(),
        Err(e) => e.into_response(),
    }
}
