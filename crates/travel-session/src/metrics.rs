//! Session metrics
//!
//! - `session_requests_total` (counter): label `status`
//! - `session_request_duration_seconds` (histogram): label `status`
//! - `session_transport_errors_total` (counter)
//! - `session_token_refresh_total` (counter): label `outcome`
//! - `session_forced_logout_total` (counter)
//!
//! Without an installed recorder every call is a no-op.

/// Histogram name; the binary configures its buckets.
pub const REQUEST_DURATION: &str = "session_request_duration_seconds";

/// Record one HTTP exchange that produced a response.
pub fn record_request(status: u16, duration_secs: f64) {
    let status = status.to_string();
    metrics::counter!("session_requests_total", "status" => status.clone()).increment(1);
    metrics::histogram!(REQUEST_DURATION, "status" => status).record(duration_secs);
}

/// Record a request that never got a response.
pub fn record_transport_error() {
    metrics::counter!("session_transport_errors_total").increment(1);
}

/// Record a refresh attempt: `success`, `failure` or `missing_token`.
pub fn record_refresh(outcome: &'static str) {
    metrics::counter!("session_token_refresh_total", "outcome" => outcome).increment(1);
}

/// Record a forced logout after an unrecoverable 401.
pub fn record_forced_logout() {
    metrics::counter!("session_forced_logout_total").increment(1);
}
