//! Observability for the User Service
//!
//! Logging goes through `tracing`; metrics through the `metrics` facade with
//! a Prometheus recorder that stamps every series with the monitored
//! resource labels.
//!
//! Key material, PEM text and issued tokens never appear in log fields.

pub mod metrics;

use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "user_service=info";

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing() -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}
