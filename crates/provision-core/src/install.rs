//! Installer selection and invocation.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use thiserror::Error;

use provision_config::{ArtifactUrl, Config};

use crate::rules::InstallDefaults;

/// Exit code reported when the install succeeded but needs a reboot.
pub const EXIT_REBOOT_REQUIRED: i32 = 3010;

/// Exit code reported when the install succeeded and initiated a reboot.
pub const EXIT_REBOOT_INITIATED: i32 = 1641;

/// Processor architecture selecting the installer variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CpuArchitecture {
    /// 64-bit operating system.
    X64,
    /// 32-bit operating system.
    X86,
}

impl CpuArchitecture {
    /// Detects the operating system architecture.
    ///
    /// A 32-bit process on a 64-bit Windows host sees
    /// `PROCESSOR_ARCHITEW6432`, so that variable takes precedence over the
    /// compile-time pointer width.
    #[must_use]
    pub fn detect() -> Self {
        if std::env::var_os("PROCESSOR_ARCHITEW6432").is_some() {
            return Self::X64;
        }
        if cfg!(target_pointer_width = "64") {
            Self::X64
        } else {
            Self::X86
        }
    }

    /// Picks the installer URL configured for this architecture.
    #[must_use]
    pub fn installer_url(self, config: &Config) -> Option<&ArtifactUrl> {
        match self {
            Self::X64 => config.installer_url_x64.as_ref(),
            Self::X86 => config.installer_url_x86.as_ref(),
        }
    }

    /// Configuration key naming the installer URL for this architecture.
    #[must_use]
    pub const fn installer_setting(self) -> &'static str {
        match self {
            Self::X64 => "installer_url_x64",
            Self::X86 => "installer_url_x86",
        }
    }
}

impl fmt::Display for CpuArchitecture {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X64 => formatter.write_str("x64"),
            Self::X86 => formatter.write_str("x86"),
        }
    }
}

/// Package path and installer properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerArguments {
    package: Utf8PathBuf,
    log_file: Utf8PathBuf,
    properties: Vec<(&'static str, String)>,
}

impl InstallerArguments {
    /// Builds the installer properties from the install-time parameters.
    #[must_use]
    pub fn new(package: &Utf8Path, config: &Config, defaults: &InstallDefaults) -> Self {
        let log_file = package.with_extension("install.log");
        Self {
            package: package.to_path_buf(),
            log_file,
            properties: vec![
                ("SERVER", defaults.server.clone()),
                ("SERVERACTIVE", defaults.server_active.clone()),
                ("LISTENPORT", config.listen_port.to_string()),
                ("ENABLEPATH", config.enable_path.clone()),
                ("ALLOWDENYKEY", config.allow_key.clone()),
                ("HOSTMETADATA", defaults.host_metadata.clone()),
            ],
        }
    }

    /// Installer package.
    #[must_use]
    pub fn package(&self) -> &Utf8Path {
        &self.package
    }

    /// Verbose installer log written next to the package.
    #[must_use]
    pub fn log_file(&self) -> &Utf8Path {
        &self.log_file
    }

    /// `KEY=value` installer properties in a stable order.
    #[must_use]
    pub fn properties(&self) -> &[(&'static str, String)] {
        &self.properties
    }
}

impl fmt::Display for InstallerArguments {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "/i \"{}\" /qn /norestart", self.package)?;
        for (key, value) in &self.properties {
            write!(formatter, " {key}=\"{value}\"")?;
        }
        Ok(())
    }
}

/// Result of a completed installer run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InstallOutcome {
    /// Installer exit code.
    pub exit_code: i32,
    /// Whether the installer asked for a reboot.
    pub reboot_required: bool,
}

impl InstallOutcome {
    /// Interprets an installer exit code.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::ExitCode`] for any code other than success or
    /// the two reboot codes.
    pub const fn from_exit_code(exit_code: i32) -> Result<Self, InstallError> {
        match exit_code {
            0 => Ok(Self {
                exit_code,
                reboot_required: false,
            }),
            EXIT_REBOOT_REQUIRED | EXIT_REBOOT_INITIATED => Ok(Self {
                exit_code,
                reboot_required: true,
            }),
            code => Err(InstallError::ExitCode { code }),
        }
    }
}

/// Runs the installer package.
pub trait PackageInstaller {
    /// Runs the installer to completion and returns its exit code.
    fn install(&self, arguments: &InstallerArguments) -> Result<i32, InstallError>;
}

/// Errors raised while installing the agent.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The installer could not be launched.
    #[error("failed to launch installer for {package}: {source}")]
    Launch {
        /// Package being installed.
        package: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The installer was terminated without an exit code.
    #[error("installer was terminated before reporting an exit code")]
    Terminated,
    /// The installer reported failure.
    #[error("installer exited with code {code}")]
    ExitCode {
        /// Exit code reported by the installer.
        code: i32,
    },
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, false)]
    #[case(EXIT_REBOOT_REQUIRED, true)]
    #[case(EXIT_REBOOT_INITIATED, true)]
    fn success_codes_are_accepted(#[case] code: i32, #[case] reboot: bool) {
        let outcome = InstallOutcome::from_exit_code(code).expect("success code");
        assert_eq!(outcome.reboot_required, reboot);
    }

    #[rstest]
    #[case(1603)]
    #[case(1618)]
    #[case(-1)]
    fn failure_codes_are_rejected(#[case] code: i32) {
        assert!(matches!(
            InstallOutcome::from_exit_code(code),
            Err(InstallError::ExitCode { code: reported }) if reported == code
        ));
    }

    #[test]
    fn arguments_carry_install_time_values() {
        let config = Config {
            listen_port: 10051,
            ..Config::default()
        };
        let defaults = InstallDefaults {
            server: String::from("10.0.0.1"),
            server_active: String::from("10.0.0.2"),
            host_metadata: String::from("Windows clients"),
        };
        let arguments = InstallerArguments::new(
            Utf8Path::new("/staging/agent.msi"),
            &config,
            &defaults,
        );
        assert_eq!(arguments.log_file(), Utf8Path::new("/staging/agent.install.log"));
        assert_eq!(
            arguments.to_string(),
            concat!(
                "/i \"/staging/agent.msi\" /qn /norestart",
                " SERVER=\"10.0.0.1\" SERVERACTIVE=\"10.0.0.2\" LISTENPORT=\"10051\"",
                " ENABLEPATH=\"1\" ALLOWDENYKEY=\"AllowKey=system.run[*]\"",
                " HOSTMETADATA=\"Windows clients\"",
            )
        );
    }

    #[test]
    fn installer_url_follows_architecture() {
        let config = Config {
            installer_url_x64: Some("https://repo.example/agent-x64.msi".parse().expect("url")),
            installer_url_x86: Some("https://repo.example/agent-x86.msi".parse().expect("url")),
            ..Config::default()
        };
        let x64 = CpuArchitecture::X64.installer_url(&config).expect("x64 url");
        let x86 = CpuArchitecture::X86.installer_url(&config).expect("x86 url");
        assert_eq!(x64.file_name(), "agent-x64.msi");
        assert_eq!(x86.file_name(), "agent-x86.msi");
    }
}
