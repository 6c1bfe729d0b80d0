//! Administrative privilege precondition.

use thiserror::Error;

/// Reports whether the process may mutate services and system files.
pub trait PrivilegeCheck {
    /// Returns `true` when the process runs with administrative rights.
    fn is_elevated(&self) -> Result<bool, PrivilegeError>;
}

/// Errors raised by the privilege precondition.
#[derive(Debug, Error)]
pub enum PrivilegeError {
    /// The process is not elevated.
    #[error("administrative privileges are required; re-run from an elevated session")]
    NotElevated,
    /// Elevation could not be determined.
    #[error("failed to determine process elevation: {0}")]
    Query(String),
}

/// Fails with [`PrivilegeError::NotElevated`] unless the check passes.
pub fn require_elevation(check: &dyn PrivilegeCheck) -> Result<(), PrivilegeError> {
    if check.is_elevated()? {
        Ok(())
    } else {
        Err(PrivilegeError::NotElevated)
    }
}
