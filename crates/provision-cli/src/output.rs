//! Output format selection and stream helpers.

use std::fmt;
use std::io::Write;

use clap::ValueEnum;
use serde::Serialize;

use crate::AppError;

/// Output format selection for command results.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Selects `human` for terminal output and `json` for redirected output.
    #[default]
    Auto,
    /// Always render human-readable output.
    Human,
    /// Always emit JSON documents.
    Json,
}

/// Output format after resolving `auto` based on TTY detection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResolvedOutputFormat {
    /// Human-readable text.
    Human,
    /// JSON documents on stdout.
    Json,
}

impl OutputFormat {
    /// Resolves the output format based on whether stdout is a terminal.
    #[must_use]
    pub const fn resolve(self, stdout_is_terminal: bool) -> ResolvedOutputFormat {
        match self {
            Self::Auto => {
                if stdout_is_terminal {
                    ResolvedOutputFormat::Human
                } else {
                    ResolvedOutputFormat::Json
                }
            }
            Self::Human => ResolvedOutputFormat::Human,
            Self::Json => ResolvedOutputFormat::Json,
        }
    }
}

/// Writers and format shared by the command handlers.
pub(crate) struct CommandOutput<W: Write, E: Write> {
    pub(crate) stdout: W,
    pub(crate) stderr: E,
    pub(crate) format: ResolvedOutputFormat,
}

impl<W: Write, E: Write> CommandOutput<W, E> {
    pub(crate) const fn new(stdout: W, stderr: E, format: ResolvedOutputFormat) -> Self {
        Self {
            stdout,
            stderr,
            format,
        }
    }

    pub(crate) const fn is_json(&self) -> bool {
        matches!(self.format, ResolvedOutputFormat::Json)
    }

    pub(crate) fn stdout_line(&mut self, args: fmt::Arguments<'_>) -> Result<(), AppError> {
        self.stdout.write_fmt(args).map_err(AppError::Output)?;
        self.stdout.write_all(b"\n").map_err(AppError::Output)?;
        self.stdout.flush().map_err(AppError::Output)
    }

    pub(crate) fn stderr_line(&mut self, args: fmt::Arguments<'_>) -> Result<(), AppError> {
        self.stderr.write_fmt(args).map_err(AppError::Output)?;
        self.stderr.write_all(b"\n").map_err(AppError::Output)?;
        self.stderr.flush().map_err(AppError::Output)
    }

    pub(crate) fn stdout_text(&mut self, text: &str) -> Result<(), AppError> {
        self.stdout
            .write_all(text.as_bytes())
            .map_err(AppError::Output)?;
        self.stdout.flush().map_err(AppError::Output)
    }

    pub(crate) fn json<T: Serialize>(&mut self, value: &T) -> Result<(), AppError> {
        serde_json::to_writer_pretty(&mut self.stdout, value).map_err(AppError::Serialise)?;
        self.stdout.write_all(b"\n").map_err(AppError::Output)?;
        self.stdout.flush().map_err(AppError::Output)
    }
}
