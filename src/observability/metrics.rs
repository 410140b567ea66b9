//! Metrics collection and exposition.
//!
//! # Metrics
//! - `snap_lookups_total` (counter): lookups by outcome (`hit`, `miss`, or error code)
//! - `snap_lookup_duration_seconds` (histogram): end-to-end lookup latency
//! - `snap_upstream_attempts_total` (counter): actor calls by result
//! - `snap_rate_limited_total` (counter): requests rejected by the rate limiter
//! - `snap_cache_entries` (gauge): profiles currently cached
//!
//! All recording goes through the `metrics` facade and is a no-op until a
//! recorder is installed by [`init_metrics`].

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished lookup.
pub fn record_lookup(outcome: &'static str, start: Instant) {
    counter!("snap_lookups_total", "outcome" => outcome).increment(1);
    histogram!("snap_lookup_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record one upstream attempt.
pub fn record_upstream_attempt(success: bool) {
    let result = if success { "ok" } else { "error" };
    counter!("snap_upstream_attempts_total", "result" => result).increment(1);
}

pub fn record_rate_limited() {
    counter!("snap_rate_limited_total").increment(1);
}

pub fn record_cache_size(entries: u64) {
    gauge!("snap_cache_entries").set(entries as f64);
}
