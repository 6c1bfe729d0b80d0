//! Shared configuration for the agent provisioning toolchain.
//!
//! Configuration is layered by `ortho_config`: built-in defaults, then a TOML
//! file discovered through `--config-path` or `AGENT_PROVISION_CONFIG_PATH`,
//! then `AGENT_PROVISION_*` environment variables, and finally command-line
//! flags. The resolved [`Config`] is immutable for the rest of the run and is
//! handed to the core pipeline as plain data.

mod artifact;
mod defaults;
mod logging;

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use artifact::{ArtifactUrl, ArtifactUrlParseError};
pub use defaults::{
    DEFAULT_ALLOW_KEY, DEFAULT_COMPLETION_DELAY_SECS, DEFAULT_DOWNLOAD_TIMEOUT_SECS,
    DEFAULT_ENABLE_PATH, DEFAULT_HOST_METADATA, DEFAULT_LISTEN_PORT, DEFAULT_LOG_FILTER,
    DEFAULT_POLL_INTERVAL_SECS, DEFAULT_SERVER, DEFAULT_SERVICE_NAME,
    DEFAULT_SERVICE_TIMEOUT_SECS, default_agent_config_path, default_download_dir,
    default_log_filter, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved configuration for a provisioning run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "AGENT_PROVISION")]
pub struct Config {
    /// Passive-check server handed to the installer.
    #[serde(default = "defaults::default_server")]
    #[ortho_config(default = defaults::default_server())]
    pub server: String,
    /// Active-check server handed to the installer.
    #[serde(default = "defaults::default_server")]
    #[ortho_config(default = defaults::default_server())]
    pub server_active: String,
    /// Port the agent listens on.
    #[serde(default = "defaults::default_listen_port")]
    #[ortho_config(default = defaults::DEFAULT_LISTEN_PORT)]
    pub listen_port: u16,
    /// Installer flag enabling the agent's path execution.
    #[serde(default = "defaults::default_enable_path")]
    #[ortho_config(default = defaults::default_enable_path())]
    pub enable_path: String,
    /// Allow/deny key policy handed to the installer.
    #[serde(default = "defaults::default_allow_key")]
    #[ortho_config(default = defaults::default_allow_key())]
    pub allow_key: String,
    /// Host metadata handed to the installer.
    #[serde(default = "defaults::default_host_metadata")]
    #[ortho_config(default = defaults::default_host_metadata())]
    pub host_metadata: String,
    /// Server written to the rewritten configuration for proxy-routed hosts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_server_address: Option<String>,
    /// Server written to the rewritten configuration for primary-routed hosts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_server_address: Option<String>,
    /// Address prefix selecting the proxy routing rule.
    #[serde(default)]
    #[ortho_config(default = String::new())]
    pub proxy_subnet_prefix: String,
    /// Address prefix selecting the primary routing rule.
    #[serde(default)]
    #[ortho_config(default = String::new())]
    pub primary_subnet_prefix: String,
    /// Name of the operating system service running the agent.
    #[serde(default = "defaults::default_service_name")]
    #[ortho_config(default = defaults::default_service_name())]
    pub service_name: String,
    /// Installer package for 64-bit hosts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installer_url_x64: Option<ArtifactUrl>,
    /// Installer package for 32-bit hosts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installer_url_x86: Option<ArtifactUrl>,
    /// Configuration template fetched alongside the installer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_url: Option<ArtifactUrl>,
    /// Location of the agent configuration file.
    #[serde(default = "defaults::default_agent_config_path")]
    #[ortho_config(default = defaults::default_agent_config_path())]
    pub agent_config_path: Utf8PathBuf,
    /// Staging directory for downloaded artefacts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<Utf8PathBuf>,
    /// Seconds between service status polls.
    #[serde(default = "defaults::default_poll_interval_secs")]
    #[ortho_config(default = defaults::DEFAULT_POLL_INTERVAL_SECS)]
    pub poll_interval_secs: u64,
    /// Upper bound for a service transition; `0` waits indefinitely.
    #[serde(default = "defaults::default_service_timeout_secs")]
    #[ortho_config(default = defaults::DEFAULT_SERVICE_TIMEOUT_SECS)]
    pub service_timeout_secs: u64,
    /// Request timeout for artefact downloads.
    #[serde(default = "defaults::default_download_timeout_secs")]
    #[ortho_config(default = defaults::DEFAULT_DOWNLOAD_TIMEOUT_SECS)]
    pub download_timeout_secs: u64,
    /// Pause before the binary exits after a successful run.
    #[serde(default)]
    #[ortho_config(default = defaults::DEFAULT_COMPLETION_DELAY_SECS)]
    pub completion_delay_secs: u64,
    /// `tracing` filter expression.
    #[serde(default = "defaults::default_log_filter_string")]
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[serde(default)]
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: defaults::default_server(),
            server_active: defaults::default_server(),
            listen_port: DEFAULT_LISTEN_PORT,
            enable_path: defaults::default_enable_path(),
            allow_key: defaults::default_allow_key(),
            host_metadata: defaults::default_host_metadata(),
            proxy_server_address: None,
            primary_server_address: None,
            proxy_subnet_prefix: String::new(),
            primary_subnet_prefix: String::new(),
            service_name: defaults::default_service_name(),
            installer_url_x64: None,
            installer_url_x86: None,
            template_url: None,
            agent_config_path: default_agent_config_path(),
            download_dir: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            service_timeout_secs: DEFAULT_SERVICE_TIMEOUT_SECS,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            completion_delay_secs: DEFAULT_COMPLETION_DELAY_SECS,
            log_filter: defaults::default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Name of the agent service.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Location of the agent configuration file.
    #[must_use]
    pub fn agent_config_path(&self) -> &Utf8Path {
        &self.agent_config_path
    }

    /// Staging directory for downloads, falling back to the temp directory.
    #[must_use]
    pub fn download_dir(&self) -> Utf8PathBuf {
        self.download_dir.clone().unwrap_or_else(default_download_dir)
    }

    /// Interval between service status polls.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Bound on a service transition, or `None` to wait indefinitely.
    #[must_use]
    pub const fn service_timeout(&self) -> Option<Duration> {
        if self.service_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.service_timeout_secs))
        }
    }

    /// Request timeout applied to artefact downloads.
    #[must_use]
    pub const fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    /// Cosmetic delay before the binary exits.
    #[must_use]
    pub const fn completion_delay(&self) -> Duration {
        Duration::from_secs(self.completion_delay_secs)
    }

    /// `tracing` filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
