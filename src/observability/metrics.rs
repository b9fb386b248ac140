//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status
//! - `proxy_request_duration_seconds` (histogram): latency distribution
//! - `chaos_decisions_total` (counter): eligible requests by context, triggered
//! - `chaos_injections_total` (counter): injected faults by kind
//! - `chaos_memory_ballast_bytes` (gauge): bytes held by HighMemory faults
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so unit tests need no setup
//! - Prometheus exporter runs its own HTTP listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::chaos::{FaultKind, RequestContext};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("proxy_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_decision(context: RequestContext, triggered: bool) {
    counter!(
        "chaos_decisions_total",
        "context" => context.as_str(),
        "triggered" => if triggered { "true" } else { "false" }
    )
    .increment(1);
}

pub fn record_injection(kind: FaultKind) {
    counter!("chaos_injections_total", "kind" => kind.as_str()).increment(1);
}

pub fn record_ballast(bytes: usize) {
    gauge!("chaos_memory_ballast_bytes").set(bytes as f64);
}
