//! Response shapes for the lookup routes.
//!
//! ```text
//! 200 { ok: true, cached, data: Profile }
//! 4xx/5xx { error: <code>, detail? }
//! ```
//! `invalid_username` carries no detail; every classified failure does.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::lookup::{LookupError, LookupOutcome, Profile};

#[derive(Debug, Serialize)]
pub struct LookupBody<'a> {
    pub ok: bool,
    pub cached: bool,
    pub data: &'a Profile,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<&'a str>,
}

impl IntoResponse for LookupOutcome {
    fn into_response(self) -> Response {
        let body = LookupBody {
            ok: true,
            cached: self.cached,
            data: &self.profile,
        };
        (StatusCode::OK, Json(body)).into_response()
    }
}

impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        let detail = match &self {
            LookupError::InvalidUsername(_) => None,
            LookupError::Failed(e) => Some(e.detail.as_str()),
        };
        let body = ErrorBody {
            error: self.code(),
            detail,
        };
        (self.status(), Json(body)).into_response()
    }
}
