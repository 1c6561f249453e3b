//! Resource labels identifying this container for metrics attribution.
//!
//! The label set always has exactly five keys. The namespace is reported as
//! `default` regardless of where the pod actually runs; that is a known
//! limitation of the monitored-resource description, not something to
//! infer at runtime.

use super::environment::{EnvironmentProvider, POD_NAME_VAR};
use super::metadata::MetadataAccessor;
use crate::errors::StartupError;
use std::collections::BTreeMap;
use std::env::VarError;
use tracing::instrument;

pub const NAMESPACE_NAME_LABEL: &str = "namespace_name";
pub const CONTAINER_NAME_LABEL: &str = "container_name";
pub const POD_NAME_LABEL: &str = "pod_name";
pub const CLUSTER_NAME_LABEL: &str = "cluster_name";
pub const LOCATION_LABEL: &str = "location";

/// All label keys, in output order.
pub const LABEL_KEYS: [&str; 5] = [
    NAMESPACE_NAME_LABEL,
    CONTAINER_NAME_LABEL,
    POD_NAME_LABEL,
    CLUSTER_NAME_LABEL,
    LOCATION_LABEL,
];

/// Namespace reported for every pod.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Labels for a `k8s_container` monitored resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLabels {
    pub namespace_name: String,
    pub container_name: String,
    pub pod_name: String,
    pub cluster_name: String,
    pub location: String,
}

impl ResourceLabels {
    /// Label key/value pairs in [`LABEL_KEYS`] order.
    pub fn pairs(&self) -> [(&'static str, &str); 5] {
        [
            (NAMESPACE_NAME_LABEL, self.namespace_name.as_str()),
            (CONTAINER_NAME_LABEL, self.container_name.as_str()),
            (POD_NAME_LABEL, self.pod_name.as_str()),
            (CLUSTER_NAME_LABEL, self.cluster_name.as_str()),
            (LOCATION_LABEL, self.location.as_str()),
        ]
    }

    /// Freshly allocated label map.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.pairs()
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }
}

/// Container (workload) name: the part of the pod name before the first
/// hyphen.
///
/// # Errors
///
/// `StartupError::UnexpectedPodNameFormat` if there is no hyphen or nothing
/// precedes it.
pub fn container_name_from_pod(pod_name: &str) -> Result<&str, StartupError> {
    match pod_name.split_once('-') {
        Some((container, _)) if !container.is_empty() => Ok(container),
        _ => Err(StartupError::UnexpectedPodNameFormat {
            var: POD_NAME_VAR.to_string(),
            pod_name: pod_name.to_string(),
        }),
    }
}

/// Build the resource label set from the environment and instance metadata.
///
/// The pod name is validated before any metadata request is made.
///
/// # Errors
///
/// - `StartupError::MissingEnvironment` - `HOSTNAME` is unset
/// - `StartupError::UnexpectedPodNameFormat` - `HOSTNAME` is not valid
///   Unicode, or see [`container_name_from_pod`]
/// - `StartupError::Metadata` - the metadata accessor failed
#[instrument(skip_all)]
pub async fn derive_resource_labels(
    env: &dyn EnvironmentProvider,
    metadata: &dyn MetadataAccessor,
) -> Result<ResourceLabels, StartupError> {
    let pod_name = env.var(POD_NAME_VAR).map_err(|e| match e {
        VarError::NotPresent => StartupError::MissingEnvironment(POD_NAME_VAR.to_string()),
        VarError::NotUnicode(raw) => StartupError::UnexpectedPodNameFormat {
            var: POD_NAME_VAR.to_string(),
            pod_name: raw.to_string_lossy().into_owned(),
        },
    })?;

    let container_name = container_name_from_pod(&pod_name)?.to_string();

    let cluster_name = metadata.cluster_name().await?;
    let location = metadata.zone().await?;

    Ok(ResourceLabels {
        namespace_name: DEFAULT_NAMESPACE.to_string(),
        container_name,
        pod_name,
        cluster_name,
        location,
    })
}
