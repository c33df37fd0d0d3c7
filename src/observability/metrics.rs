//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define relay metrics (requests, latency, sessions)
//! - Expose a Prometheus-compatible scrape endpoint
//!
//! # Metrics
//! - `relay_requests_total` (counter): relayed requests by method, status
//! - `relay_request_duration_seconds` (histogram): end-to-end latency
//! - `relay_upstream_errors_total` (counter): relay-side failures by kind
//! - `relay_session_events_total` (counter): registered, revoked, expired, evicted
//! - `relay_sessions_active` (gauge): live session handles
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Labels never carry client ids or credentials

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics recorder"),
    }
}

/// Record a completed relay exchange.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    counter!("relay_requests_total", &labels).increment(1);
    histogram!("relay_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

/// Record a failure produced by the relay itself.
pub fn record_upstream_error(kind: &'static str) {
    counter!("relay_upstream_errors_total", "kind" => kind).increment(1);
}

/// Record `count` session-handle lifecycle events of one kind.
pub fn record_session_event(event: &'static str, count: u64) {
    counter!("relay_session_events_total", "event" => event).increment(count);
}

/// Current number of live session handles.
pub fn record_sessions_active(count: usize) {
    gauge!("relay_sessions_active").set(count as f64);
}
