//! Metrics definitions for the User Service
//!
//! All metrics follow Prometheus naming conventions:
//! - `us_` prefix for User Service
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Resource attribution
//!
//! Every series carries the monitored-resource labels (`namespace_name`,
//! `container_name`, `pod_name`, `cluster_name`, `location`) as global
//! labels, set once when the recorder is installed.
//!
//! # Cardinality
//!
//! Per-call labels are bounded:
//! - `status`: 2 values (success, error)
//! - `step`: 2 values (signing_key, resource_labels)

use crate::monitoring::MonitoredResource;
use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Build the Prometheus exporter configuration for `resource`.
///
/// # Errors
///
/// Returns an error if histogram buckets are rejected.
pub fn prometheus_builder(resource: &MonitoredResource) -> Result<PrometheusBuilder, String> {
    let builder = PrometheusBuilder::new()
        // RSA-2048 signing is single-digit milliseconds
        .set_buckets_for_metric(
            Matcher::Prefix("us_token_issuance".to_string()),
            &[0.001, 0.002, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250],
        )
        .map_err(|e| format!("Failed to set token issuance buckets: {e}"))?;

    Ok(resource
        .labels
        .pairs()
        .into_iter()
        .fold(builder, |builder, (key, value)| {
            builder.add_global_label(key, value)
        }))
}

/// Install the Prometheus recorder for `resource` and return its handle.
///
/// Series recorded before this call go to the no-op recorder and are lost;
/// startup step outcomes are replayed afterwards through
/// `Bootstrapped::record_startup_metrics`.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder(resource: &MonitoredResource) -> Result<PrometheusHandle, String> {
    prometheus_builder(resource)?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

/// Handler for GET /metrics
///
/// Returns the Prometheus text format for scraping. No secrets or
/// per-user values are ever recorded, so the endpoint is unauthenticated.
#[tracing::instrument(skip_all, name = "us.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}

/// Router exposing `handle` at `/metrics`.
pub fn metrics_router(handle: PrometheusHandle) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(handle)
}

// ============================================================================
// Startup Metrics
// ============================================================================

/// Record the outcome of one startup step.
///
/// Metric: `us_startup_step_total`
/// Labels: `step`, `status`
pub fn record_startup_step(step: &'static str, status: &'static str) {
    counter!("us_startup_step_total", "step" => step, "status" => status).increment(1);
}

// ============================================================================
// Token Metrics
// ============================================================================

/// Record token issuance duration and outcome
///
/// Metric: `us_token_issuance_duration_seconds`, `us_token_issuance_total`
/// Labels: `status`
pub fn record_token_issuance(status: &'static str, duration: Duration) {
    histogram!("us_token_issuance_duration_seconds", "status" => status)
        .record(duration.as_secs_f64());

    counter!("us_token_issuance_total", "status" => status).increment(1);
}
