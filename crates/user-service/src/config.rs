//! User Service configuration.
//!
//! Configuration is loaded from environment variables. The private key is
//! held as a `SecretString` and redacted in Debug output.

use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// PEM/PKCS8 RSA private key used to sign tokens.
pub const PRIVATE_KEY_VAR: &str = "USER_SERVICE_PRIVATE_KEY";

/// Token lifetime in seconds.
pub const TOKEN_EXPIRY_SECONDS_VAR: &str = "USER_SERVICE_TOKEN_EXPIRY_SECONDS";

/// Metadata server host override (`host[:port]`).
pub const METADATA_HOST_VAR: &str = "GCE_METADATA_HOST";

/// Per-request metadata server timeout in seconds.
pub const METADATA_TIMEOUT_SECONDS_VAR: &str = "USER_SERVICE_METADATA_TIMEOUT_SECONDS";

/// Default metadata server request timeout.
pub const DEFAULT_METADATA_TIMEOUT_SECONDS: u64 = 5;

/// Listen address for the Prometheus `/metrics` endpoint.
pub const METRICS_BIND_ADDRESS_VAR: &str = "USER_SERVICE_METRICS_BIND_ADDRESS";

/// Default listen address for the metrics endpoint.
pub const DEFAULT_METRICS_BIND_ADDRESS: &str = "0.0.0.0:9090";

/// User Service configuration.
#[derive(Clone)]
pub struct Config {
    /// PEM-armored PKCS8 private key.
    /// Protected by `SecretString` to prevent accidental logging.
    pub private_key_pem: SecretString,

    /// Lifetime of issued tokens, always > 0.
    pub token_expiry_seconds: u64,

    /// Metadata server base URL when overridden, e.g. `http://127.0.0.1:8080`.
    pub metadata_endpoint: Option<String>,

    /// Per-request metadata server timeout.
    pub metadata_timeout: Duration,

    /// Address the `/metrics` endpoint binds to.
    pub metrics_bind_address: String,
}

/// Custom Debug implementation that redacts the private key.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("private_key_pem", &"[REDACTED]")
            .field("token_expiry_seconds", &self.token_expiry_seconds)
            .field("metadata_endpoint", &self.metadata_endpoint)
            .field("metadata_timeout", &self.metadata_timeout)
            .field("metrics_bind_address", &self.metrics_bind_address)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let private_key_pem = SecretString::from(
            vars.get(PRIVATE_KEY_VAR)
                .ok_or_else(|| ConfigError::MissingEnvVar(PRIVATE_KEY_VAR.to_string()))?
                .clone(),
        );

        let token_expiry_seconds = parse_positive_seconds(
            TOKEN_EXPIRY_SECONDS_VAR,
            vars.get(TOKEN_EXPIRY_SECONDS_VAR)
                .ok_or_else(|| ConfigError::MissingEnvVar(TOKEN_EXPIRY_SECONDS_VAR.to_string()))?,
        )?;

        let metadata_endpoint = match vars.get(METADATA_HOST_VAR).map(|host| host.trim()) {
            Some(host) if !host.is_empty() => Some(metadata_endpoint_from_host(host)?),
            _ => None,
        };

        let metadata_timeout_seconds = match vars.get(METADATA_TIMEOUT_SECONDS_VAR) {
            Some(value) => parse_positive_seconds(METADATA_TIMEOUT_SECONDS_VAR, value)?,
            None => DEFAULT_METADATA_TIMEOUT_SECONDS,
        };

        let metrics_bind_address = vars
            .get(METRICS_BIND_ADDRESS_VAR)
            .cloned()
            .unwrap_or_else(|| DEFAULT_METRICS_BIND_ADDRESS.to_string());

        Ok(Config {
            private_key_pem,
            token_expiry_seconds,
            metadata_endpoint,
            metadata_timeout: Duration::from_secs(metadata_timeout_seconds),
            metrics_bind_address,
        })
    }
}

/// Metadata base URL for a `GCE_METADATA_HOST` value.
///
/// The variable normally holds `host[:port]`; an explicit `http://` or
/// `https://` prefix is kept as given.
fn metadata_endpoint_from_host(host: &str) -> Result<String, ConfigError> {
    match host.split_once("://") {
        None => Ok(format!("http://{host}")),
        Some(("http" | "https", rest)) if !rest.is_empty() => Ok(host.to_string()),
        Some(_) => Err(ConfigError::InvalidValue {
            var: METADATA_HOST_VAR.to_string(),
            reason: format!("expected host[:port] or an http(s) URL, got {host:?}"),
        }),
    }
}

/// Parse a strictly positive integer number of seconds.
///
/// Negative numbers are reported as non-positive rather than as a parse
/// failure, so the operator sees the actual constraint.
fn parse_positive_seconds(var: &str, value: &str) -> Result<u64, ConfigError> {
    let parsed: i64 = value.trim().parse().map_err(|e| ConfigError::InvalidValue {
        var: var.to_string(),
        reason: format!("expected an integer number of seconds, got {value:?} ({e})"),
    })?;

    if parsed <= 0 {
        return Err(ConfigError::InvalidValue {
            var: var.to_string(),
            reason: format!("must be a positive number of seconds, got {parsed}"),
        });
    }

    u64::try_from(parsed).map_err(|e| ConfigError::InvalidValue {
        var: var.to_string(),
        reason: e.to_string(),
    })
}
