//! Routing rules mapping host identity to agent configuration values.

use serde::Serialize;

use provision_config::Config;

use crate::host::{HostIdentity, SystemRole};

/// Host metadata written for servers on a routed subnet.
pub const SERVER_HOST_METADATA: &str = "Windows servers";

/// Host metadata written for every other host.
pub const CLIENT_HOST_METADATA: &str = "Windows clients";

/// Install-time values handed to the package installer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallDefaults {
    /// Passive-check server.
    pub server: String,
    /// Active-check server.
    pub server_active: String,
    /// Host metadata.
    pub host_metadata: String,
}

impl From<&Config> for InstallDefaults {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            server_active: config.server_active.clone(),
            host_metadata: config.host_metadata.clone(),
        }
    }
}

/// Deployment-specific routing constants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingRules {
    /// Address prefix of the proxy-routed subnet.
    pub proxy_subnet_prefix: String,
    /// Address prefix of the primary-routed subnet.
    pub primary_subnet_prefix: String,
    /// Server for proxy-routed hosts and the default rule.
    pub proxy_server_address: Option<String>,
    /// Server for primary-routed hosts.
    pub primary_server_address: Option<String>,
}

impl From<&Config> for RoutingRules {
    fn from(config: &Config) -> Self {
        Self {
            proxy_subnet_prefix: config.proxy_subnet_prefix.clone(),
            primary_subnet_prefix: config.primary_subnet_prefix.clone(),
            proxy_server_address: config.proxy_server_address.clone(),
            primary_server_address: config.primary_server_address.clone(),
        }
    }
}

/// Values written into the agent configuration after installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigAssignment {
    /// `Server=` value.
    pub server: String,
    /// `ServerActive=` value.
    pub server_active: String,
    /// `HostMetaData=` value.
    pub host_metadata: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Proxy,
    Primary,
}

fn matches_prefix(identity: &HostIdentity, prefix: &str) -> bool {
    !prefix.is_empty() && identity.primary_ipv4.to_string().starts_with(prefix)
}

fn assignment_for(
    route: Route,
    metadata: &str,
    rules: &RoutingRules,
    defaults: &InstallDefaults,
) -> ConfigAssignment {
    let address = match route {
        Route::Proxy => rules.proxy_server_address.as_deref(),
        Route::Primary => rules.primary_server_address.as_deref(),
    };
    ConfigAssignment {
        server: address.unwrap_or(&defaults.server).to_owned(),
        server_active: address.unwrap_or(&defaults.server_active).to_owned(),
        host_metadata: metadata.to_owned(),
    }
}

/// Selects the configuration values for a host; the first matching rule wins.
///
/// | condition                               | route   | metadata          |
/// |-----------------------------------------|---------|-------------------|
/// | proxy prefix and [`SystemRole::Server`]   | proxy   | `Windows servers` |
/// | primary prefix and [`SystemRole::Server`] | primary | `Windows servers` |
/// | otherwise                               | proxy   | `Windows clients` |
///
/// An unset routing address falls back to the install-time value.
#[must_use]
pub fn resolve(
    identity: &HostIdentity,
    rules: &RoutingRules,
    defaults: &InstallDefaults,
) -> ConfigAssignment {
    let is_server = identity.system_role == SystemRole::Server;
    let (route, metadata) = if is_server && matches_prefix(identity, &rules.proxy_subnet_prefix) {
        (Route::Proxy, SERVER_HOST_METADATA)
    } else if is_server && matches_prefix(identity, &rules.primary_subnet_prefix) {
        (Route::Primary, SERVER_HOST_METADATA)
    } else {
        (Route::Proxy, CLIENT_HOST_METADATA)
    };
    let assignment = assignment_for(route, metadata, rules, defaults);
    tracing::debug!(
        target: "agent_provision::rules",
        route = ?route,
        server = %assignment.server,
        host_metadata = %assignment.host_metadata,
        "resolved configuration assignment"
    );
    assignment
}
