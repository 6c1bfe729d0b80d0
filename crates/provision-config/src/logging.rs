//! Log output formats for provisioning runs.
//!
//! Interactive runs default to compact lines on the console. Deployment
//! tooling that collects stderr usually wants [`LogFormat::Json`], one object
//! per event, and never ANSI colour codes.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Supported logging output formats.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event with fields flattened to the top level.
    Json,
    /// Single-line human output.
    #[default]
    Compact,
}

impl LogFormat {
    /// Whether colour codes may be emitted when stderr is `terminal`.
    #[must_use]
    pub const fn uses_ansi(self, terminal: bool) -> bool {
        terminal && matches!(self, Self::Compact)
    }
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;
