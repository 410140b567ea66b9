//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Assemble the lookup pipeline (cache, actor client, retry policy)
//! - Create the Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, limits, CORS, rate limit)
//! - Serve until the shutdown signal, then drain
//! - Run background maintenance (rate limiter pruning)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::time;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::cache::MemoryProfileCache;
use crate::config::SnapConfig;
use crate::http::health::{health, not_found, root};
use crate::http::lookup::{lookup_get, lookup_post};
use crate::http::request::{make_request_span, propagate_request_id_layer, set_request_id_layer};
use crate::lookup::LookupService;
use crate::resilience::RetryPolicy;
use crate::security::limits::{body_limit_layer, cors_layer, in_flight_middleware, InFlightLimit};
use crate::security::{rate_limit_middleware, RateLimiter};
use crate::upstream::apify::{ApifyClient, ClientBuildError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub lookup: Arc<LookupService>,
    pub environment: Arc<str>,
}

/// HTTP server for the lookup proxy.
pub struct HttpServer {
    router: Router,
    rate_limiter: Option<Arc<RateLimiter>>,
}

impl HttpServer {
    /// Create a server backed by the configured Apify actor.
    pub fn new(config: SnapConfig) -> Result<Self, ClientBuildError> {
        if config.upstream.token.is_none() {
            tracing::warn!("APIFY_TOKEN is not set; actor calls will be rejected upstream");
        }

        let source = Arc::new(ApifyClient::new(&config.upstream)?);
        let cache = Arc::new(MemoryProfileCache::from_config(&config.cache));
        let lookup = LookupService::new(cache, source, RetryPolicy::from_config(&config.retries));

        Ok(Self::with_service(config, Arc::new(lookup)))
    }

    /// Create a server around an already assembled lookup service.
    pub fn with_service(config: SnapConfig, lookup: Arc<LookupService>) -> Self {
        let state = AppState {
            lookup,
            environment: Arc::from(config.environment.as_str()),
        };

        let rate_limiter = config
            .rate_limit
            .enabled
            .then(|| Arc::new(RateLimiter::new(&config.rate_limit)));

        let router = Self::build_router(&config, state, rate_limiter.clone());
        Self {
            router,
            rate_limiter,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &SnapConfig, state: AppState, rate_limiter: Option<Arc<RateLimiter>>) -> Router {
        // Unknown paths and methods under the prefix still count against the limit.
        let mut lookup_routes = Router::new()
            .route("/lookup", post(lookup_post).get(lookup_get).fallback(not_found))
            .fallback(not_found);
        if let Some(limiter) = rate_limiter {
            lookup_routes = lookup_routes.layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));
        }

        let router = Router::new()
            .route("/", get(root))
            .route("/health", get(health))
            .nest("/api/snap", lookup_routes)
            .fallback(not_found)
            .with_state(state)
            .layer(body_limit_layer(&config.security))
            .layer(middleware::from_fn_with_state(
                InFlightLimit::new(&config.listener),
                in_flight_middleware,
            ))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer());

        if config.security.cors_enabled {
            router.layer(cors_layer())
        } else {
            router
        }
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        if let Some(limiter) = self.rate_limiter.clone() {
            let stop = shutdown.resubscribe();
            tokio::spawn(prune_rate_limiter(limiter, stop));
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// A clone of the fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

async fn prune_rate_limiter(limiter: Arc<RateLimiter>, mut shutdown: broadcast::Receiver<()>) {
    let mut ticker = time::interval(limiter.window());
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = limiter.prune_idle();
                if removed > 0 {
                    tracing::debug!(removed, tracked = limiter.tracked_clients(), "Pruned idle rate limit buckets");
                }
            }
            _ = shutdown.recv() => {
                tracing::debug!("Rate limiter pruning stopped");
                break;
            }
        }
    }
}
