//! Startup sequence: signing key first, then resource discovery.
//!
//! Both steps are fatal on failure and every outcome is logged. The
//! Prometheus recorder needs the discovered resource labels, so it cannot
//! exist while these steps run; completed steps are kept on
//! [`Bootstrapped`] and counted under `us_startup_step_total` once the
//! recorder is installed.

use crate::config::{Config, PRIVATE_KEY_VAR};
use crate::crypto::load_private_key;
use crate::errors::StartupError;
use crate::monitoring::{
    discover_monitored_resource, EnvironmentProvider, MetadataAccessor, MonitoredResource,
};
use crate::observability::metrics::record_startup_step;
use crate::services::TokenIssuer;
use common::secret::ExposeSecret;
use tracing::{error, info, instrument};

pub const STEP_SIGNING_KEY: &str = "signing_key";
pub const STEP_RESOURCE_LABELS: &str = "resource_labels";

/// Everything the service needs once startup has succeeded.
#[derive(Debug)]
pub struct Bootstrapped {
    pub token_issuer: TokenIssuer,
    pub monitored_resource: MonitoredResource,
    completed_steps: Vec<&'static str>,
}

impl Bootstrapped {
    /// Steps that completed, in order.
    pub fn completed_steps(&self) -> &[&'static str] {
        &self.completed_steps
    }

    /// Count every completed step against the current recorder.
    ///
    /// Call after the metrics recorder is installed.
    pub fn record_startup_metrics(&self) {
        for &step in &self.completed_steps {
            record_startup_step(step, "success");
        }
    }
}

/// Run the startup sequence.
///
/// The signing key is loaded before the environment or metadata server is
/// consulted, so a bad key fails fast without network traffic.
///
/// # Errors
///
/// The first `StartupError` from either step.
#[instrument(skip_all)]
pub async fn run(
    config: &Config,
    env: &dyn EnvironmentProvider,
    metadata: &dyn MetadataAccessor,
) -> Result<Bootstrapped, StartupError> {
    let mut completed_steps = Vec::with_capacity(2);

    let token_issuer = log_step(
        STEP_SIGNING_KEY,
        load_private_key(config.private_key_pem.expose_secret())
            .and_then(|key| TokenIssuer::new(key, config.token_expiry_seconds)),
    )?;
    completed_steps.push(STEP_SIGNING_KEY);
    info!(
        target: "bootstrap",
        var = PRIVATE_KEY_VAR,
        expiry_seconds = token_issuer.expiry_seconds(),
        "Signing key loaded"
    );

    let monitored_resource = log_step(
        STEP_RESOURCE_LABELS,
        discover_monitored_resource(env, metadata).await,
    )?;
    completed_steps.push(STEP_RESOURCE_LABELS);
    let labels = &monitored_resource.labels;
    info!(
        target: "bootstrap",
        resource_type = monitored_resource.resource_type,
        project_id = %monitored_resource.project_id,
        container_name = %labels.container_name,
        pod_name = %labels.pod_name,
        cluster_name = %labels.cluster_name,
        location = %labels.location,
        "Monitored resource discovered"
    );

    Ok(Bootstrapped {
        token_issuer,
        monitored_resource,
        completed_steps,
    })
}

fn log_step<T>(step: &'static str, result: Result<T, StartupError>) -> Result<T, StartupError> {
    if let Err(e) = &result {
        error!(
            target: "bootstrap",
            step,
            error_kind = e.kind(),
            error = %e,
            "Startup step failed"
        );
    }
    result
}
