use camino::Utf8PathBuf;
use std::env;

use crate::logging::LogFormat;

/// Default passive and active server handed to the installer.
pub const DEFAULT_SERVER: &str = "127.0.0.1";

/// Default agent listen port.
pub const DEFAULT_LISTEN_PORT: u16 = 10050;

/// Default installer path-execution flag.
pub const DEFAULT_ENABLE_PATH: &str = "1";

/// Default allow/deny key policy.
pub const DEFAULT_ALLOW_KEY: &str = "AllowKey=system.run[*]";

/// Default install-time host metadata.
pub const DEFAULT_HOST_METADATA: &str = "Windows clients";

/// Default name of the agent service.
pub const DEFAULT_SERVICE_NAME: &str = "Zabbix Agent 2";

/// Default seconds between service status polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;

/// Default bound on a service transition.
pub const DEFAULT_SERVICE_TIMEOUT_SECS: u64 = 300;

/// Default artefact download timeout.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 600;

/// Default pause before the binary exits.
pub const DEFAULT_COMPLETION_DELAY_SECS: u64 = 0;

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

const DEFAULT_AGENT_CONFIG_PATH: &str = r"C:\Program Files\Zabbix Agent 2\zabbix_agent2.conf";

pub(crate) fn default_server() -> String {
    DEFAULT_SERVER.to_owned()
}

pub(crate) const fn default_listen_port() -> u16 {
    DEFAULT_LISTEN_PORT
}

pub(crate) fn default_enable_path() -> String {
    DEFAULT_ENABLE_PATH.to_owned()
}

pub(crate) fn default_allow_key() -> String {
    DEFAULT_ALLOW_KEY.to_owned()
}

pub(crate) fn default_host_metadata() -> String {
    DEFAULT_HOST_METADATA.to_owned()
}

pub(crate) fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.to_owned()
}

pub(crate) const fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

pub(crate) const fn default_service_timeout_secs() -> u64 {
    DEFAULT_SERVICE_TIMEOUT_SECS
}

pub(crate) const fn default_download_timeout_secs() -> u64 {
    DEFAULT_DOWNLOAD_TIMEOUT_SECS
}

/// Default log filter expression used by the binary.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub(crate) fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binary.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Default location of the agent configuration file.
#[must_use]
pub fn default_agent_config_path() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_AGENT_CONFIG_PATH)
}

/// Staging directory used when no download directory is configured.
#[must_use]
pub fn default_download_dir() -> Utf8PathBuf {
    let mut base = Utf8PathBuf::from_path_buf(env::temp_dir())
        .unwrap_or_else(|_| Utf8PathBuf::from(fallback_temp_dir()));
    base.push("agent-provision");
    base
}

#[cfg(windows)]
const fn fallback_temp_dir() -> &'static str {
    r"C:\Windows\Temp"
}

#[cfg(not(windows))]
const fn fallback_temp_dir() -> &'static str {
    "/tmp"
}
