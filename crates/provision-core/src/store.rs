//! Agent configuration file storage.

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use time::OffsetDateTime;
use time::macros::format_description;

/// Reads templates and replaces the agent configuration file.
pub trait ConfigStore {
    /// Renames an existing configuration file to a timestamped backup.
    ///
    /// Returns the backup path, or `None` when no file existed.
    fn backup(&self, path: &Utf8Path) -> Result<Option<Utf8PathBuf>, ConfigFileError>;

    /// Reads a template file.
    fn read_template(&self, path: &Utf8Path) -> Result<String, ConfigFileError>;

    /// Writes the rendered configuration.
    fn write_config(&self, path: &Utf8Path, contents: &str) -> Result<(), ConfigFileError>;
}

/// Errors raised while handling configuration files.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// A backup rename failed.
    #[error("failed to back up {path} to {backup}: {source}")]
    Backup {
        /// Existing configuration file.
        path: Utf8PathBuf,
        /// Intended backup location.
        backup: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A template could not be read.
    #[error("failed to read template {path}: {source}")]
    ReadTemplate {
        /// Template path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The configuration could not be written.
    #[error("failed to write configuration {path}: {source}")]
    Write {
        /// Configuration path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The backup timestamp could not be formatted.
    #[error("failed to format backup timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// [`ConfigStore`] backed by the local filesystem.
#[derive(Debug, Clone, Copy)]
pub struct FsConfigStore {
    now: fn() -> OffsetDateTime,
}

impl Default for FsConfigStore {
    fn default() -> Self {
        Self {
            now: OffsetDateTime::now_utc,
        }
    }
}

impl FsConfigStore {
    /// Builds a store that timestamps backups with `now`.
    #[must_use]
    pub const fn with_clock(now: fn() -> OffsetDateTime) -> Self {
        Self { now }
    }

    fn backup_path(&self, path: &Utf8Path) -> Result<Utf8PathBuf, ConfigFileError> {
        let stamp = (self.now)().format(format_description!(
            "[year][month][day][hour][minute][second]"
        ))?;
        let file_name = path.file_name().unwrap_or("agent.conf");
        Ok(path.with_file_name(format!("{file_name}.{stamp}.bak")))
    }
}

impl ConfigStore for FsConfigStore {
    fn backup(&self, path: &Utf8Path) -> Result<Option<Utf8PathBuf>, ConfigFileError> {
        if !path.exists() {
            return Ok(None);
        }
        let backup = self.backup_path(path)?;
        fs::rename(path, &backup).map_err(|source| ConfigFileError::Backup {
            path: path.to_path_buf(),
            backup: backup.clone(),
            source,
        })?;
        tracing::info!(
            target: "agent_provision::store",
            path = %path,
            backup = %backup,
            "backed up existing configuration"
        );
        Ok(Some(backup))
    }

    fn read_template(&self, path: &Utf8Path) -> Result<String, ConfigFileError> {
        fs::read_to_string(path).map_err(|source| ConfigFileError::ReadTemplate {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write_config(&self, path: &Utf8Path, contents: &str) -> Result<(), ConfigFileError> {
        let write_error = |source| ConfigFileError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        fs::write(path, contents).map_err(write_error)
    }
}
