//! Metrics collection and exposition.
//!
//! # Metrics
//! - `api_requests_total` (counter): handled requests by endpoint, status
//! - `api_rate_limited_total` (counter): 429s by endpoint
//! - `api_upstream_failures_total` (counter): failed collaborator calls by service
//! - `api_notifications_total` (counter): notification outcomes
//! - `api_rate_limit_tracked_clients` (gauge): identities held per limiter
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::config::Endpoint;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(endpoint: Endpoint, status: u16) {
    metrics::counter!(
        "api_requests_total",
        "endpoint" => endpoint.name(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_rate_limited(endpoint: Endpoint) {
    metrics::counter!("api_rate_limited_total", "endpoint" => endpoint.name()).increment(1);
}

pub fn record_upstream_failure(service: &'static str) {
    metrics::counter!("api_upstream_failures_total", "service" => service).increment(1);
}

pub fn record_notification(outcome: &'static str) {
    metrics::counter!("api_notifications_total", "outcome" => outcome).increment(1);
}

pub fn record_tracked_clients(endpoint: Endpoint, tracked: usize) {
    metrics::gauge!("api_rate_limit_tracked_clients", "endpoint" => endpoint.name())
        .set(tracked as f64);
}
