//! Shared utilities for integration testing.
//!
//! `MockActor` stands in for the Apify API: it serves the three endpoints
//! the client touches and answers every run with a programmable behavior.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use snap_proxy::config::SnapConfig;
use snap_proxy::http::HttpServer;
use snap_proxy::lifecycle::Shutdown;
use tokio::net::TcpListener;

pub const TOKEN: &str = "apify_api_test_secret";

/// What the mock actor answers when a run is started.
#[derive(Clone)]
pub enum Behavior {
    /// The run succeeds and its dataset holds these items.
    Items(Vec<Value>),
    /// Starting the run fails with this status and error body.
    Fail(u16, Value),
    /// The token is rejected; the error message echoes it back.
    RejectToken,
}

struct MockState {
    behavior: Mutex<Behavior>,
    runs: AtomicU32,
    inputs: Mutex<Vec<Value>>,
}

/// Handle to a running mock actor API.
#[derive(Clone)]
pub struct MockActor {
    pub addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockActor {
    pub async fn start(behavior: Behavior) -> Self {
        let state = Arc::new(MockState {
            behavior: Mutex::new(behavior),
            runs: AtomicU32::new(0),
            inputs: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v2/acts/{actor}/runs", post(start_run))
            .route("/v2/actor-runs/{id}", get(get_run))
            .route("/v2/datasets/{id}/items", get(list_items))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of run requests received.
    pub fn runs(&self) -> u32 {
        self.state.runs.load(Ordering::SeqCst)
    }

    /// Actor inputs received, in order.
    pub fn inputs(&self) -> Vec<Value> {
        self.state.inputs.lock().unwrap().clone()
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.state.behavior.lock().unwrap() = behavior;
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TOKEN))
        .unwrap_or(false)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": {
                "type": "user-or-token-not-found",
                "message": format!("User was not found or authentication token is not valid ({})", TOKEN)
            }
        })),
    )
        .into_response()
}

fn run_object(id: &str) -> Value {
    json!({
        "data": {
            "id": id,
            "status": "SUCCEEDED",
            "defaultDatasetId": format!("ds-{}", id)
        }
    })
}

async fn start_run(
    State(state): State<Arc<MockState>>,
    Path(_actor): Path<String>,
    headers: HeaderMap,
    Json(input): Json<Value>,
) -> Response {
    let n = state.runs.fetch_add(1, Ordering::SeqCst) + 1;
    state.inputs.lock().unwrap().push(input);

    if !authorized(&headers) {
        return unauthorized();
    }

    let behavior = state.behavior.lock().unwrap().clone();
    match behavior {
        Behavior::Items(_) => Json(run_object(&format!("run{}", n))).into_response(),
        Behavior::RejectToken => unauthorized(),
        Behavior::Fail(status, body) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(body)).into_response()
        }
    }
}

async fn get_run(Path(id): Path<String>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(run_object(&id)).into_response()
}

async fn list_items(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    match state.behavior.lock().unwrap().clone() {
        Behavior::Items(items) => Json(Value::Array(items)).into_response(),
        _ => Json(json!([])).into_response(),
    }
}

/// Proxy configuration pointed at `actor`, with the test token set.
pub fn proxy_config(actor: &MockActor) -> SnapConfig {
    let mut config = SnapConfig::default();
    config.environment = "test".to_string();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.api_base = actor.url();
    config.upstream.token = Some(TOKEN.to_string());
    config.upstream.request_timeout_secs = 5;
    config.upstream.run_wait_secs = 1;
    config
}

/// A proxy running on an ephemeral port.
pub struct RunningProxy {
    pub base: String,
    shutdown: Shutdown,
}

impl RunningProxy {
    pub async fn start(config: SnapConfig) -> Self {
        let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let server = HttpServer::new(config).expect("server builds");
        let server_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, server_shutdown).await;
        });

        Self {
            base: format!("http://{}", addr),
            shutdown,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

impl Drop for RunningProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
