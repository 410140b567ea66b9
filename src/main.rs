//! Snap lookup proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                     SNAP PROXY                        │
//!   POST /api/snap/    │  ┌──────────┐   ┌────────────┐   ┌────────────────┐  │
//!   lookup ────────────┼─▶│ security │──▶│   lookup   │──▶│     cache      │  │
//!                      │  │ cors/rate│   │  service   │   │  (moka, TTL)   │  │
//!                      │  └──────────┘   └─────┬──────┘   └────────────────┘  │
//!                      │                       │ miss                          │
//!                      │                       ▼                               │
//!                      │                ┌────────────┐    ┌────────────────┐  │
//!                      │                │ resilience │───▶│    upstream    │──┼──▶ Apify
//!                      │                │   retry    │    │  actor client  │  │
//!                      │                └────────────┘    └────────────────┘  │
//!                      │                                                       │
//!                      │   config · observability · lifecycle                  │
//!                      └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use snap_proxy::config::resolve_config;
use snap_proxy::lifecycle::signals::wait_for_signal;
use snap_proxy::observability::{logging, metrics};
use snap_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "snap-proxy", version, about = "Snapchat profile lookup proxy")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "SNAP_PROXY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = resolve_config(args.config.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "snap-proxy starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        environment = %config.environment,
        actor_id = %config.upstream.actor_id,
        max_attempts = config.retries.max_attempts,
        cache_ttl_secs = config.cache.ttl_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "API listening");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
