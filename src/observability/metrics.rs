//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pathmux_requests_total` (counter): routing outcomes by method
//! - `pathmux_request_duration_seconds` (histogram): handler latency by
//!   method and status
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - The Prometheus exporter is optional and runs its own listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Routing decision, used as the `outcome` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Dispatched,
    Options,
    NotFound,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Dispatched => "dispatched",
            Outcome::Options => "options",
            Outcome::NotFound => "not_found",
        }
    }
}

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Count one routing decision.
pub fn record_request(method: &str, outcome: Outcome) {
    metrics::counter!(
        "pathmux_requests_total",
        "method" => method.to_owned(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record how long a request took, from `start` until now.
pub fn record_duration(method: &str, status: u16, start: Instant) {
    metrics::histogram!(
        "pathmux_request_duration_seconds",
        "method" => method.to_owned(),
        "status" => status.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::Dispatched.as_str(), "dispatched");
        assert_eq!(Outcome::Options.as_str(), "options");
        assert_eq!(Outcome::NotFound.as_str(), "not_found");
    }

    #[test]
    fn test_recording_without_recorder() {
        record_request("GET", Outcome::NotFound);
        record_duration("GET", 404, Instant::now());
    }
}
