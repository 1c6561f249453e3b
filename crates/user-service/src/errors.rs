use crate::config::{ConfigError, PRIVATE_KEY_VAR};
use thiserror::Error;

/// Errors that abort service startup.
///
/// None of these are retried or recovered. Display strings name the
/// configuration value or environment variable an operator has to fix.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Malformed private key in {}: {0}", PRIVATE_KEY_VAR)]
    MalformedKey(String),

    #[error("Unsupported key algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Missing required environment variable: {0}")]
    MissingEnvironment(String),

    #[error("Unexpected pod name format in {var}: {pod_name:?} (expected <name>-<suffix>)")]
    UnexpectedPodNameFormat { var: String, pod_name: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Metadata server error: {0}")]
    Metadata(String),

    #[error("Metrics exporter error: {0}")]
    Metrics(String),

    #[error("Token signing failed: {0}")]
    Signing(String),
}

impl StartupError {
    /// Bounded label value for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            StartupError::MalformedKey(_) => "malformed_key",
            StartupError::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            StartupError::MissingEnvironment(_) => "missing_environment",
            StartupError::UnexpectedPodNameFormat { .. } => "unexpected_pod_name_format",
            StartupError::Config(_) => "config",
            StartupError::Metadata(_) => "metadata",
            StartupError::Metrics(_) => "metrics",
            StartupError::Signing(_) => "signing",
        }
    }
}
