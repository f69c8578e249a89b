//! Prometheus metrics

use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder and describe the metrics.
///
/// Safe to call once at startup; later calls return the existing handle.
pub fn init_metrics() -> PrometheusHandle {
    HANDLE
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            metrics::describe_counter!("turns_total", "Accepted user messages");
            metrics::describe_counter!("turn_errors_total", "Turns that emitted the error event");
            metrics::describe_histogram!(
                "turn_duration_seconds",
                "End-to-end latency of one turn"
            );

            handle
        })
        .clone()
}

/// Record one completed turn
pub fn record_turn(elapsed: Duration) {
    metrics::counter!("turns_total").increment(1);
    metrics::histogram!("turn_duration_seconds").record(elapsed.as_secs_f64());
}

/// Record one failed turn
pub fn record_turn_error() {
    metrics::counter!("turn_errors_total").increment(1);
}

/// `GET /metrics`
pub async fn metrics_handler() -> String {
    HANDLE.get().map(|h| h.render()).unwrap_or_default()
}
