use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Location of a downloadable artefact such as an installer or template.
///
/// Only `http` and `https` URLs are accepted, and the URL must end in a file
/// name so the artefact can be staged under a predictable path.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactUrl {
    url: Url,
}

impl ArtifactUrl {
    /// Borrows the parsed URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Final path segment, used as the staged file name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default()
    }
}

impl fmt::Display for ArtifactUrl {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.url)
    }
}

impl FromStr for ArtifactUrl {
    type Err = ArtifactUrlParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(input)?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(ArtifactUrlParseError::UnsupportedScheme(other.to_owned())),
        }
        let candidate = Self { url };
        if candidate.file_name().is_empty() {
            return Err(ArtifactUrlParseError::MissingFileName(input.to_owned()));
        }
        Ok(candidate)
    }
}

impl TryFrom<String> for ArtifactUrl {
    type Error = ArtifactUrlParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ArtifactUrl> for String {
    fn from(value: ArtifactUrl) -> Self {
        value.url.into()
    }
}

/// Errors encountered while parsing an [`ArtifactUrl`] from text.
#[derive(Debug, Error)]
pub enum ArtifactUrlParseError {
    /// Scheme was not `http` or `https`.
    #[error("unsupported artefact scheme '{0}'")]
    UnsupportedScheme(String),
    /// The URL path did not name a file.
    #[error("artefact URL '{0}' does not end in a file name")]
    MissingFileName(String),
    /// URL failed to parse.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_is_last_segment() {
        let artifact: ArtifactUrl = "https://repo.example/agent/zabbix_agent2-7.0-x64.msi"
            .parse()
            .expect("valid url");
        assert_eq!(artifact.file_name(), "zabbix_agent2-7.0-x64.msi");
    }

    #[test]
    fn rejects_non_http_scheme() {
        let error = "ftp://repo.example/agent.msi"
            .parse::<ArtifactUrl>()
            .expect_err("ftp is unsupported");
        assert!(matches!(error, ArtifactUrlParseError::UnsupportedScheme(scheme) if scheme == "ftp"));
    }

    #[test]
    fn rejects_directory_url() {
        let error = "https://repo.example/agent/"
            .parse::<ArtifactUrl>()
            .expect_err("directory has no file name");
        assert!(matches!(error, ArtifactUrlParseError::MissingFileName(_)));
    }

    #[test]
    fn serialises_as_plain_string() {
        let artifact: ArtifactUrl = "https://repo.example/agent.conf".parse().expect("valid url");
        let json = serde_json::to_string(&artifact).expect("serialise");
        assert_eq!(json, "\"https://repo.example/agent.conf\"");
    }
}
