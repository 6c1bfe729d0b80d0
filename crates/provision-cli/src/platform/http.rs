//! Artefact downloads over HTTP.

use std::fs::{self, File};
use std::time::Duration;

use camino::Utf8Path;
use reqwest::blocking::Client;

use provision_config::ArtifactUrl;
use provision_core::{ArtifactFetcher, FetchError};

/// [`ArtifactFetcher`] using a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub(crate) struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub(crate) fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("agent-provision/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl ArtifactFetcher for HttpFetcher {
    fn fetch(&self, url: &ArtifactUrl, destination: &Utf8Path) -> Result<(), FetchError> {
        let transport = |error: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            message: error.to_string(),
        };
        let write_error = |source| FetchError::Write {
            path: destination.to_path_buf(),
            source,
        };

        let mut response = self.client.get(url.url().clone()).send().map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if let Some(parent) = destination.parent().filter(|parent| !parent.as_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        let mut file = File::create(destination).map_err(write_error)?;
        let bytes = response.copy_to(&mut file).map_err(transport)?;
        tracing::debug!(
            target: "agent_provision::fetch",
            url = %url,
            path = %destination,
            bytes,
            "downloaded artefact"
        );
        Ok(())
    }
}
