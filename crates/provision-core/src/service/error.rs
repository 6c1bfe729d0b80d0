//! Error types for service lifecycle control.

use std::time::Duration;

use thiserror::Error;

use super::types::TransitionTarget;

/// Failures reported by the service manager.
#[derive(Debug, Error)]
pub enum ServiceControlError {
    /// The service is not installed.
    #[error("service '{name}' does not exist")]
    NotFound {
        /// Service name.
        name: String,
    },
    /// The caller lacks rights to control the service.
    #[error("access denied while trying to {operation} service '{name}'")]
    AccessDenied {
        /// Operation attempted.
        operation: &'static str,
        /// Service name.
        name: String,
    },
    /// The service manager rejected or failed the command.
    #[error("failed to {operation} service '{name}': {message}")]
    Command {
        /// Operation attempted.
        operation: &'static str,
        /// Service name.
        name: String,
        /// Diagnostic from the service manager.
        message: String,
    },
    /// The reported status could not be interpreted.
    #[error("unrecognised service status '{0}'")]
    UnknownStatus(String),
}

/// Errors raised by [`super::ServiceController`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service manager failed.
    #[error(transparent)]
    Control(#[from] ServiceControlError),
    /// The service did not reach the target status in time.
    #[error("service '{name}' did not become {target} within {timeout_ms} ms")]
    Timeout {
        /// Service name.
        name: String,
        /// Status being waited for.
        target: TransitionTarget,
        /// Bound that elapsed.
        timeout_ms: u128,
    },
}

impl ServiceError {
    pub(crate) fn timeout(name: &str, target: TransitionTarget, timeout: Duration) -> Self {
        Self::Timeout {
            name: name.to_owned(),
            target,
            timeout_ms: timeout.as_millis(),
        }
    }
}
