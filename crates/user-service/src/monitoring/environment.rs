//! Process environment access behind a trait so label derivation can run
//! against a fixed map in tests.

use std::collections::HashMap;
use std::env::VarError;

/// Environment variable holding the pod name (Kubernetes sets it to the
/// pod name by default).
pub const POD_NAME_VAR: &str = "HOSTNAME";

/// Read-only view of environment variables.
pub trait EnvironmentProvider: Send + Sync {
    /// Value of `name`.
    ///
    /// # Errors
    ///
    /// `VarError::NotPresent` if unset, `VarError::NotUnicode` if the value
    /// is not valid Unicode.
    fn var(&self, name: &str) -> Result<String, VarError>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl EnvironmentProvider for ProcessEnvironment {
    fn var(&self, name: &str) -> Result<String, VarError> {
        std::env::var(name)
    }
}

impl EnvironmentProvider for HashMap<String, String> {
    fn var(&self, name: &str) -> Result<String, VarError> {
        self.get(name).cloned().ok_or(VarError::NotPresent)
    }
}
