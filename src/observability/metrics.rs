//! Metrics collection.
//!
//! Counters are recorded through the `metrics` facade. Without an installed
//! recorder they are no-ops.
//!
//! # Metrics
//! - `paged_fetch_requests_total` (counter): logical fetches by endpoint, outcome
//! - `paged_fetch_retries_total` (counter): scheduled retries
//! - `paged_fetch_failures_total` (counter): terminal failures by endpoint, kind
//! - `paged_fetch_stale_results_total` (counter): results dropped after supersession

use ::metrics::counter;

/// Record the end of a logical fetch.
pub fn record_request(endpoint: &str, succeeded: bool) {
    let outcome = if succeeded { "success" } else { "failure" };
    counter!(
        "paged_fetch_requests_total",
        "endpoint" => endpoint.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_retry() {
    counter!("paged_fetch_retries_total").increment(1);
}

/// Record a terminal failure, labelled by error kind.
pub fn record_failure(endpoint: &str, kind: &'static str) {
    counter!(
        "paged_fetch_failures_total",
        "endpoint" => endpoint.to_string(),
        "kind" => kind
    )
    .increment(1);
}

pub fn record_stale_result(endpoint: &str) {
    counter!("paged_fetch_stale_results_total", "endpoint" => endpoint.to_string()).increment(1);
}
