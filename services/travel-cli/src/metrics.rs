//! Prometheus recorder for one CLI run
//!
//! The session crates emit `session_*` metrics; this binary installs the
//! recorder and prints the text exposition on `--metrics`.

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use travel_session::metrics::REQUEST_DURATION;

/// Request latency buckets, 5ms up to the 60s ceiling of `timeout_secs`.
const DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
];

fn builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full(REQUEST_DURATION.to_string()),
        DURATION_BUCKETS,
    )
}

/// Install the global recorder and return a handle for rendering.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    builder()?.install_recorder()
}
