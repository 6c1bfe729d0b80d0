//! Process elevation check.

use provision_core::{PrivilegeCheck, PrivilegeError};

/// Reports whether the current process runs with administrative rights.
#[derive(Debug, Clone, Default)]
pub(crate) struct ProcessPrivilege {
    #[cfg(windows)]
    shell: super::powershell::PowerShell,
}

#[cfg(windows)]
const ELEVATION_SCRIPT: &str = concat!(
    "([Security.Principal.WindowsPrincipal][Security.Principal.WindowsIdentity]::GetCurrent())",
    ".IsInRole([Security.Principal.WindowsBuiltInRole]::Administrator)"
);

#[cfg(windows)]
impl PrivilegeCheck for ProcessPrivilege {
    fn is_elevated(&self) -> Result<bool, PrivilegeError> {
        let output = self
            .shell
            .run(ELEVATION_SCRIPT)
            .map_err(|error| PrivilegeError::Query(error.message()))?;
        match output.as_str() {
            "True" => Ok(true),
            "False" => Ok(false),
            other => Err(PrivilegeError::Query(format!(
                "unexpected elevation result '{other}'"
            ))),
        }
    }
}

#[cfg(unix)]
impl PrivilegeCheck for ProcessPrivilege {
    fn is_elevated(&self) -> Result<bool, PrivilegeError> {
        // SAFETY: `geteuid` has no preconditions and cannot fail.
        let uid = unsafe { libc::geteuid() };
        Ok(uid == 0)
    }
}
