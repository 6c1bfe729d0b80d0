//! `msiexec` package installer.

use std::ffi::OsString;
use std::process::{Command, Stdio};

use provision_core::{InstallError, InstallerArguments, PackageInstaller};

const DEFAULT_PROGRAM: &str = "msiexec.exe";

/// [`PackageInstaller`] running `msiexec` silently.
#[derive(Debug, Clone)]
pub(crate) struct MsiexecInstaller {
    program: OsString,
}

impl Default for MsiexecInstaller {
    fn default() -> Self {
        Self::with_program(DEFAULT_PROGRAM)
    }
}

impl MsiexecInstaller {
    pub(crate) fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, arguments: &InstallerArguments) -> Command {
        let mut command = Command::new(&self.program);
        // msiexec parses its own command line, so `KEY="value"` must reach it
        // without the standard argument quoting.
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            command.raw_arg(format!(
                "{arguments} /l*v \"{}\"",
                arguments.log_file()
            ));
        }
        #[cfg(not(windows))]
        {
            command
                .args(["/i", arguments.package().as_str(), "/qn", "/norestart", "/l*v"])
                .arg(arguments.log_file().as_str())
                .args(
                    arguments
                        .properties()
                        .iter()
                        .map(|(key, value)| format!("{key}={value}")),
                );
        }
        command
    }
}

impl PackageInstaller for MsiexecInstaller {
    fn install(&self, arguments: &InstallerArguments) -> Result<i32, InstallError> {
        tracing::info!(
            target: "agent_provision::installer",
            package = %arguments.package(),
            log = %arguments.log_file(),
            "launching installer"
        );
        let status = self
            .command(arguments)
            .stdin(Stdio::null())
            .status()
            .map_err(|source| InstallError::Launch {
                package: arguments.package().to_path_buf(),
                source,
            })?;
        status.code().ok_or(InstallError::Terminated)
    }
}

#[cfg(test)]
mod tests {
    use camino::Utf8Path;
    use provision_config::Config;
    use provision_core::InstallDefaults;

    use super::*;

    fn arguments() -> InstallerArguments {
        let config = Config::default();
        InstallerArguments::new(
            Utf8Path::new("/staging/agent.msi"),
            &config,
            &InstallDefaults::from(&config),
        )
    }

    #[test]
    fn missing_installer_reports_launch_failure() {
        let installer = MsiexecInstaller::with_program("/nonexistent/msiexec");
        let error = installer.install(&arguments()).expect_err("program is missing");
        assert!(matches!(
            error,
            InstallError::Launch { ref package, .. } if package == "/staging/agent.msi"
        ));
    }

    #[cfg(not(windows))]
    #[test]
    fn command_carries_every_property() {
        let installer = MsiexecInstaller::default();
        let command = installer.command(&arguments());
        let args: Vec<String> = command
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args.first().map(String::as_str), Some("/i"));
        assert!(args.iter().any(|arg| arg == "LISTENPORT=10050"));
        assert!(args.iter().any(|arg| arg == "ALLOWDENYKEY=AllowKey=system.run[*]"));
        assert!(args.iter().any(|arg| arg == "/staging/agent.install.log"));
    }
}
