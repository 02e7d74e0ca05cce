//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status
//! - `gateway_request_duration_seconds` (histogram): latency until headers are sent
//! - `gateway_rejections_total` (counter): policy and upstream rejections by reason
//! - `gateway_response_bytes_total` (counter): body bytes relayed to callers
//! - `gateway_rate_limit_clients` (gauge): client windows held in memory
//!
//! Without an installed exporter every call here is a no-op.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rejection(reason: &'static str) {
    counter!("gateway_rejections_total", "reason" => reason).increment(1);
}

pub fn record_response_bytes(bytes: u64) {
    counter!("gateway_response_bytes_total").increment(bytes);
}

pub fn record_rate_limit_clients(count: usize) {
    gauge!("gateway_rate_limit_clients").set(count as f64);
}
