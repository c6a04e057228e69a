//! Prometheus Metrics Module
//!
//! Exposes relay metrics in Prometheus format.
//!
//! # Metrics Categories
//!
//! - **Requests**: Inbound requests per route
//! - **Upstream**: Outbound requests by endpoint and outcome, with latency
//! - **Fallbacks**: Responses served from synthesized or literal data
//! - **Session**: Cookie refreshes and invalidations
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the relay port. Recording before
//! [`init_metrics`] is a no-op.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Repeated calls return the handle installed by the first one.
///
/// # Errors
///
/// Returns an error if another global recorder is already installed.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();

    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "nse_proxy_requests_total",
        "Total inbound requests by route"
    );
    describe_counter!(
        "nse_proxy_fallbacks_total",
        "Total responses served from fallback data by route"
    );
    describe_counter!(
        "nse_proxy_upstream_requests_total",
        "Total upstream API requests by endpoint and outcome"
    );
    describe_histogram!(
        "nse_proxy_upstream_request_seconds",
        "Upstream API request latency"
    );
    describe_counter!(
        "nse_proxy_cookie_refreshes_total",
        "Total session cookie refresh attempts by outcome"
    );
    describe_counter!(
        "nse_proxy_cookie_invalidations_total",
        "Total session cookie invalidations after auth rejections"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Record an inbound request.
pub fn record_request(route: &'static str) {
    counter!("nse_proxy_requests_total", "route" => route).increment(1);
}

/// Record a response served from fallback data.
pub fn record_fallback(route: &'static str) {
    counter!("nse_proxy_fallbacks_total", "route" => route).increment(1);
}

/// Record an upstream API request and its latency.
pub fn record_upstream_request(endpoint: &'static str, outcome: &'static str, elapsed: Duration) {
    counter!(
        "nse_proxy_upstream_requests_total",
        "endpoint" => endpoint,
        "outcome" => outcome
    )
    .increment(1);
    histogram!(
        "nse_proxy_upstream_request_seconds",
        "endpoint" => endpoint
    )
    .record(elapsed.as_secs_f64());
}

/// Record a cookie refresh attempt.
pub fn record_cookie_refresh(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!("nse_proxy_cookie_refreshes_total", "outcome" => outcome).increment(1);
}

/// Record a cookie invalidation.
pub fn record_cookie_invalidation() {
    counter!("nse_proxy_cookie_invalidations_total").increment(1);
}

// =============================================================================
// Tests
// =============================================================================
