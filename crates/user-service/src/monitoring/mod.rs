//! Monitored-resource discovery for the metrics exporter.
//!
//! Metrics are attributed to a `k8s_container` resource. Its labels come
//! from the pod name in the environment and from the instance metadata
//! server; its project comes from the metadata server.

pub mod environment;
pub mod labels;
pub mod metadata;

pub use environment::{EnvironmentProvider, ProcessEnvironment, POD_NAME_VAR};
pub use labels::{derive_resource_labels, ResourceLabels};
pub use metadata::{GceMetadataClient, MetadataAccessor};

use crate::errors::StartupError;
use tracing::instrument;

/// Monitored entity kind: a container running in a Kubernetes cluster.
pub const RESOURCE_TYPE_K8S_CONTAINER: &str = "k8s_container";

/// Description of the entity metrics are reported against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredResource {
    pub resource_type: &'static str,
    pub project_id: String,
    pub labels: ResourceLabels,
}

/// Discover the monitored resource for this process.
///
/// Labels are derived first so that environment problems surface without
/// any metadata traffic.
///
/// # Errors
///
/// See [`derive_resource_labels`]; additionally `StartupError::Metadata` if
/// the project id cannot be read.
#[instrument(skip_all)]
pub async fn discover_monitored_resource(
    env: &dyn EnvironmentProvider,
    metadata: &dyn MetadataAccessor,
) -> Result<MonitoredResource, StartupError> {
    let labels = derive_resource_labels(env, metadata).await?;
    let project_id = metadata.project_id().await?;

    Ok(MonitoredResource {
        resource_type: RESOURCE_TYPE_K8S_CONTAINER,
        project_id,
        labels,
    })
}
