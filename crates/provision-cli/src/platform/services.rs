//! Service manager backed by the PowerShell service cmdlets.

use provision_core::{ServiceControlError, ServiceManager, ServiceStatus};

use super::powershell::{PowerShell, PowerShellError, quote};

/// [`ServiceManager`] using `Get-Service`, `Stop-Service`, and `Start-Service`.
#[derive(Debug, Clone, Default)]
pub(crate) struct PowerShellServices {
    shell: PowerShell,
}

impl PowerShellServices {
    fn invoke(
        &self,
        operation: &'static str,
        name: &str,
        script: &str,
    ) -> Result<String, ServiceControlError> {
        self.shell
            .run(script)
            .map_err(|error| classify_failure(operation, name, &error))
    }
}

fn classify_failure(operation: &'static str, name: &str, error: &PowerShellError) -> ServiceControlError {
    let message = error.message();
    if message.contains("Cannot find any service") || message.contains("NoServiceFoundForGivenName")
    {
        ServiceControlError::NotFound {
            name: name.to_owned(),
        }
    } else if message.contains("Access is denied") || message.contains("PermissionDenied") {
        ServiceControlError::AccessDenied {
            operation,
            name: name.to_owned(),
        }
    } else {
        ServiceControlError::Command {
            operation,
            name: name.to_owned(),
            message,
        }
    }
}

fn parse_status(output: &str) -> Result<Option<ServiceStatus>, ServiceControlError> {
    if output.trim().is_empty() {
        Ok(None)
    } else {
        output.parse().map(Some)
    }
}

impl ServiceManager for PowerShellServices {
    fn query(&self, name: &str) -> Result<Option<ServiceStatus>, ServiceControlError> {
        let script = format!(
            "$service = Get-Service -Name {} -ErrorAction SilentlyContinue; \
             if ($null -ne $service) {{ $service.Status.ToString() }}",
            quote(name)
        );
        parse_status(&self.invoke("query", name, &script)?)
    }

    fn stop(&self, name: &str) -> Result<(), ServiceControlError> {
        let script = format!("Stop-Service -Name {} -Force -ErrorAction Stop", quote(name));
        self.invoke("stop", name, &script).map(|_| ())
    }

    fn start(&self, name: &str) -> Result<(), ServiceControlError> {
        let script = format!("Start-Service -Name {} -ErrorAction Stop", quote(name));
        self.invoke("start", name, &script).map(|_| ())
    }
}
