//! `install`: the full provisioning pipeline.

use std::io::Write;
use std::thread;

use provision_config::Config;
use provision_core::{Collaborators, Orchestrator};

use crate::AppError;
use crate::output::CommandOutput;

pub(super) fn run<W: Write, E: Write>(
    config: &Config,
    collaborators: Collaborators<'_>,
    output: &mut CommandOutput<W, E>,
) -> Result<(), AppError> {
    let outcome = Orchestrator::new(config, collaborators).run();
    if output.is_json() {
        match &outcome {
            Ok(report) => output.json(report)?,
            Err(failure) => output.json(&failure.report)?,
        }
    }
    let report = outcome?;

    for warning in &report.template_warnings {
        output.stderr_line(format_args!("warning: {warning}"))?;
    }
    if report.reboot_required {
        output.stderr_line(format_args!(
            "warning: the installer requested a reboot (exit code {})",
            report.installer_exit_code.unwrap_or_default()
        ))?;
    }
    let server = report
        .assignment
        .as_ref()
        .map_or("", |assignment| assignment.server.as_str());
    output.stderr_line(format_args!(
        "Provisioning complete: service '{}' is running and reports to {server}.",
        config.service_name()
    ))?;
    thread::sleep(config.completion_delay());
    Ok(())
}
