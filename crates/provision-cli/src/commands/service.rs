//! `service {start|stop|status}`.

use std::io::Write;

use serde::Serialize;

use provision_config::Config;
use provision_core::{
    PollPolicy, PrivilegeCheck, ServiceController, ServiceManager, ServiceStatus,
    require_elevation,
};

use crate::AppError;
use crate::cli::ServiceAction;
use crate::output::CommandOutput;

#[derive(Debug, Serialize)]
struct ServiceDocument<'a> {
    service: &'a str,
    status: Option<ServiceStatus>,
}

pub(super) fn run<W: Write, E: Write>(
    config: &Config,
    action: ServiceAction,
    privilege: &dyn PrivilegeCheck,
    services: &dyn ServiceManager,
    output: &mut CommandOutput<W, E>,
) -> Result<(), AppError> {
    let name = config.service_name();
    let controller = ServiceController::new(services, PollPolicy::from(config));
    match action {
        ServiceAction::Status => {}
        ServiceAction::Stop => {
            require_elevation(privilege)?;
            controller.stop(name)?;
        }
        ServiceAction::Start => {
            require_elevation(privilege)?;
            controller.start(name)?;
        }
    }
    let status = controller.status(name)?;

    if output.is_json() {
        return output.json(&ServiceDocument {
            service: name,
            status,
        });
    }
    match status {
        Some(status) => output.stdout_line(format_args!("{name}: {status}")),
        None => output.stdout_line(format_args!("{name}: not installed")),
    }
}
