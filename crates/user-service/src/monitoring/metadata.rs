//! Cloud instance metadata: project, cluster, zone.
//!
//! [`GceMetadataClient`] talks to the GCE metadata server. The server is only
//! reachable from inside a GCE/GKE instance; set `GCE_METADATA_HOST` to point
//! at an emulator elsewhere. Timeouts are per request and owned by this
//! client; callers do not retry.

use crate::errors::StartupError;
use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, RequestBuilder};
use std::time::Duration;
use tracing::instrument;

/// Default metadata server root.
pub const METADATA_ROOT: &str = "http://metadata.google.internal";

pub const METADATA_FLAVOR: &str = "Metadata-Flavor";
pub const METADATA_FLAVOR_VALUE: &str = "Google";

pub const PROJECT_ID_PATH: &str = "/computeMetadata/v1/project/project-id";
pub const CLUSTER_NAME_PATH: &str = "/computeMetadata/v1/instance/attributes/cluster-name";
pub const ZONE_PATH: &str = "/computeMetadata/v1/instance/zone";

/// Connection timeout for the metadata server.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Identifying information about the current instance and cluster.
#[async_trait]
pub trait MetadataAccessor: Send + Sync {
    /// Current project identifier.
    async fn project_id(&self) -> Result<String, StartupError>;

    /// Name of the cluster this instance belongs to.
    async fn cluster_name(&self) -> Result<String, StartupError>;

    /// Zone of this instance, e.g. `us-central1-b`.
    async fn zone(&self) -> Result<String, StartupError>;
}

/// Client for the GCE metadata server.
#[derive(Clone, Debug)]
pub struct GceMetadataClient {
    endpoint: String,
    inner: ReqwestClient,
}

impl GceMetadataClient {
    /// Create a client for `endpoint_override`, or [`METADATA_ROOT`].
    ///
    /// # Errors
    ///
    /// `StartupError::Metadata` if the HTTP client cannot be built.
    pub fn new(endpoint_override: Option<String>, timeout: Duration) -> Result<Self, StartupError> {
        let endpoint = endpoint_override
            .unwrap_or_else(|| METADATA_ROOT.to_string())
            .trim_end_matches('/')
            .to_string();

        let inner = ReqwestClient::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| StartupError::Metadata(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { endpoint, inner })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request(&self, path: &str) -> RequestBuilder {
        self.inner
            .get(format!("{}{}", self.endpoint, path))
            .header(METADATA_FLAVOR, METADATA_FLAVOR_VALUE)
    }

    /// Fetch a metadata value as trimmed text.
    #[instrument(skip(self))]
    async fn get_value(&self, path: &str) -> Result<String, StartupError> {
        let response = self
            .request(path)
            .send()
            .await
            .map_err(|e| StartupError::Metadata(format!("request to {path} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StartupError::Metadata(format!(
                "{path} returned status {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| StartupError::Metadata(format!("reading {path} failed: {e}")))?;

        let value = body.trim();
        if value.is_empty() {
            return Err(StartupError::Metadata(format!("{path} returned an empty value")));
        }

        tracing::debug!(target: "metadata", path, "Metadata value fetched");
        Ok(value.to_string())
    }
}

#[async_trait]
impl MetadataAccessor for GceMetadataClient {
    async fn project_id(&self) -> Result<String, StartupError> {
        self.get_value(PROJECT_ID_PATH).await
    }

    async fn cluster_name(&self) -> Result<String, StartupError> {
        self.get_value(CLUSTER_NAME_PATH).await
    }

    async fn zone(&self) -> Result<String, StartupError> {
        let zone = self.get_value(ZONE_PATH).await?;
        zone_from_path(&zone).map(str::to_string)
    }
}

/// Reduce `projects/<number>/zones/<zone>` to `<zone>`.
///
/// A value without slashes is returned as is.
///
/// # Errors
///
/// `StartupError::Metadata` if the final segment is empty.
pub fn zone_from_path(zone: &str) -> Result<&str, StartupError> {
    match zone.rsplit('/').next() {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(StartupError::Metadata(format!(
            "{ZONE_PATH} returned {zone:?} with no zone name"
        ))),
    }
}

/// Mock metadata accessor for testing.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fixed metadata values, or a failure on every call.
    pub struct StaticMetadata {
        project_id: String,
        cluster_name: String,
        zone: String,
        return_error: bool,
        call_count: AtomicUsize,
    }

    impl StaticMetadata {
        /// Create a mock returning the given values.
        pub fn new(project_id: &str, cluster_name: &str, zone: &str) -> Self {
            Self {
                project_id: project_id.to_string(),
                cluster_name: cluster_name.to_string(),
                zone: zone.to_string(),
                return_error: false,
                call_count: AtomicUsize::new(0),
            }
        }

        /// Create a mock whose every call fails.
        pub fn failing() -> Self {
            Self {
                return_error: true,
                ..Self::new("", "", "")
            }
        }

        /// Number of calls made across all three operations.
        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        fn answer(&self, value: &str) -> Result<String, StartupError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);

            if self.return_error {
                return Err(StartupError::Metadata(
                    "Mock metadata server error".to_string(),
                ));
            }

            Ok(value.to_string())
        }
    }

    #[async_trait]
    impl MetadataAccessor for StaticMetadata {
        async fn project_id(&self) -> Result<String, StartupError> {
            self.answer(&self.project_id)
        }

        async fn cluster_name(&self) -> Result<String, StartupError> {
            self.answer(&self.cluster_name)
        }

        async fn zone(&self) -> Result<String, StartupError> {
            self.answer(&self.zone)
        }
    }
}
