//! `classify`: host identity and the values the rules resolve to.

use std::io::Write;

use serde::Serialize;

use provision_config::Config;
use provision_core::{
    ConfigAssignment, HostIdentity, HostProbe, InstallDefaults, RoutingRules, classify, resolve,
};

use crate::AppError;
use crate::output::CommandOutput;

#[derive(Debug, Serialize)]
struct Classification {
    identity: HostIdentity,
    host_name: String,
    assignment: ConfigAssignment,
}

pub(super) fn run<W: Write, E: Write>(
    config: &Config,
    probe: &dyn HostProbe,
    output: &mut CommandOutput<W, E>,
) -> Result<(), AppError> {
    let identity = classify(probe)?;
    let host_name = probe.host_name()?;
    let assignment = resolve(
        &identity,
        &RoutingRules::from(config),
        &InstallDefaults::from(config),
    );
    let classification = Classification {
        identity,
        host_name,
        assignment,
    };
    if output.is_json() {
        return output.json(&classification);
    }

    let Classification {
        identity,
        host_name,
        assignment,
    } = &classification;
    output.stdout_line(format_args!("primary_ipv4:  {}", identity.primary_ipv4))?;
    output.stdout_line(format_args!("system_role:   {}", identity.system_role))?;
    output.stdout_line(format_args!("host_name:     {host_name}"))?;
    output.stdout_line(format_args!("server:        {}", assignment.server))?;
    output.stdout_line(format_args!("server_active: {}", assignment.server_active))?;
    output.stdout_line(format_args!("host_metadata: {}", assignment.host_metadata))
}
