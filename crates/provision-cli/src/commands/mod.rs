//! Command handlers.
//!
//! Each handler receives the resolved configuration, the collaborators it
//! needs, and a [`CommandOutput`](crate::output::CommandOutput). Human text
//! for progress and warnings goes to stderr; results go to stdout.

mod classify;
mod install;
mod render;
mod service;

use std::io::Write;

use provision_config::Config;
use provision_core::Collaborators;

use crate::AppError;
use crate::cli::CliCommand;
use crate::output::CommandOutput;

pub(crate) fn execute<W: Write, E: Write>(
    command: CliCommand,
    config: &Config,
    collaborators: Collaborators<'_>,
    output: &mut CommandOutput<W, E>,
) -> Result<(), AppError> {
    match command {
        CliCommand::Install => install::run(config, collaborators, output),
        CliCommand::Classify => classify::run(config, collaborators.probe, output),
        CliCommand::Render(args) => render::run(
            config,
            &args,
            collaborators.probe,
            collaborators.store,
            output,
        ),
        CliCommand::Service { action } => service::run(
            config,
            action,
            collaborators.privilege,
            collaborators.services,
            output,
        ),
    }
}
