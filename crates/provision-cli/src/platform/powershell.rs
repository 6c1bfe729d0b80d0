//! Non-interactive PowerShell invocation.

use std::ffi::OsString;
use std::io;
use std::process::{Command, Stdio};

use thiserror::Error;

const DEFAULT_PROGRAM: &str = "powershell.exe";

/// Runs PowerShell scripts and captures their output.
#[derive(Debug, Clone)]
pub(crate) struct PowerShell {
    program: OsString,
}

impl Default for PowerShell {
    fn default() -> Self {
        Self::with_program(DEFAULT_PROGRAM)
    }
}

/// Failures raised while running a script.
#[derive(Debug, Error)]
pub(crate) enum PowerShellError {
    #[error("failed to launch {program:?}: {source}")]
    Launch {
        program: OsString,
        #[source]
        source: io::Error,
    },
    #[error("script exited with status {status:?}: {stderr}")]
    Failed { status: Option<i32>, stderr: String },
}

impl PowerShellError {
    /// Diagnostic text used to classify the failure.
    pub(crate) fn message(&self) -> String {
        match self {
            Self::Launch { .. } => self.to_string(),
            Self::Failed { stderr, .. } => stderr.clone(),
        }
    }
}

impl PowerShell {
    pub(crate) fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Runs `script` and returns its trimmed standard output.
    pub(crate) fn run(&self, script: &str) -> Result<String, PowerShellError> {
        let output = Command::new(&self.program)
            .args([
                "-NoProfile",
                "-NonInteractive",
                "-ExecutionPolicy",
                "Bypass",
                "-Command",
                script,
            ])
            .stdin(Stdio::null())
            .output()
            .map_err(|source| PowerShellError::Launch {
                program: self.program.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(PowerShellError::Failed {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
    }
}

/// Quotes `value` as a single-quoted PowerShell string literal.
pub(crate) fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
