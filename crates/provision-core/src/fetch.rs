//! Artefact download abstraction.

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

use provision_config::ArtifactUrl;

/// Downloads an artefact to a local path.
pub trait ArtifactFetcher {
    /// Fetches `url` into `destination`, replacing any existing file.
    fn fetch(&self, url: &ArtifactUrl, destination: &Utf8Path) -> Result<(), FetchError>;
}

/// Errors raised while downloading artefacts.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read.
    #[error("failed to download {url}: {message}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Transport diagnostic.
        message: String,
    },
    /// The server answered with a non-success status.
    #[error("download of {url} failed with HTTP status {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// The download could not be written locally.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Destination path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
