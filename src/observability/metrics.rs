//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by decode strategy, status
//! - `gateway_request_duration_seconds` (histogram): latency by strategy
//! - `gateway_errors_total` (counter): failures by error class
//! - `gateway_operations_total` (counter): operations executed
//! - `gateway_uploads_total` (counter): file parts spliced
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(strategy: &'static str, status: u16, start_time: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "strategy" => strategy,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("gateway_request_duration_seconds", "strategy" => strategy)
        .record(start_time.elapsed().as_secs_f64());
}

pub fn record_error(class: &'static str) {
    metrics::counter!("gateway_errors_total", "class" => class).increment(1);
}

pub fn record_operations(count: usize) {
    metrics::counter!("gateway_operations_total").increment(count as u64);
}

pub fn record_uploads(count: usize) {
    metrics::counter!("gateway_uploads_total").increment(count as u64);
}
