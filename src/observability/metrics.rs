//! Metrics collection and exposition.
//!
//! # Metrics
//! - `kms_client_requests_total` (counter): outbound requests by outcome
//! - `kms_client_request_duration_seconds` (histogram): round-trip latency
//!
//! # Design Decisions
//! - Exposed only when `metrics-host` is set
//! - Recording without an installed exporter is a no-op

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape listener on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one outbound request.
pub fn record_client_request(method: &str, outcome: &'static str, elapsed: Duration) {
    metrics::counter!(
        "kms_client_requests_total",
        "method" => method.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("kms_client_request_duration_seconds", "outcome" => outcome)
        .record(elapsed.as_secs_f64());
}
