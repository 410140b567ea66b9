//! Request limits and cross-origin policy.
//!
//! # Responsibilities
//! - Enforce maximum request body size (413 Payload Too Large)
//! - Bound requests in flight with a semaphore (callers wait for a slot)
//! - Answer CORS preflights for browser clients

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Semaphore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;

use crate::config::{ListenerConfig, SecurityConfig};

/// Reject bodies larger than `max_body_bytes`.
pub fn body_limit_layer(config: &SecurityConfig) -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(config.max_body_bytes)
}

/// Any origin may call GET and POST.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

/// Shared slot pool for in-flight requests.
#[derive(Clone)]
pub struct InFlightLimit {
    slots: Arc<Semaphore>,
}

impl InFlightLimit {
    pub fn new(config: &ListenerConfig) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(config.max_connections)),
        }
    }

    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }
}

/// Hold a slot for the lifetime of the request.
pub async fn in_flight_middleware(
    State(limit): State<InFlightLimit>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let _permit = match limit.slots.clone().acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => return StatusCode::SERVICE_UNAVAILABLE.into_response(),
    };
    next.run(request).await
}
