//! Command-line argument definitions.

use std::net::Ipv4Addr;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand, ValueEnum};

use provision_core::SystemRole;

use crate::output::OutputFormat;

/// Command-line interface for the agent provisioning tool.
#[derive(Parser, Debug)]
#[command(
    name = "agent-provision",
    about = "Installs and configures the monitoring agent on this host",
    disable_help_subcommand = true
)]
pub(crate) struct Cli {
    /// Controls how results are rendered.
    #[arg(long, value_enum, default_value_t = OutputFormat::Auto)]
    pub(crate) output: OutputFormat,
    /// Command to run.
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum CliCommand {
    /// Runs the full provisioning pipeline.
    Install,
    /// Classifies the host and prints the resolved configuration values.
    Classify,
    /// Renders a local template to stdout without touching the host.
    Render(RenderArgs),
    /// Controls the agent service.
    Service {
        /// Lifecycle action to perform.
        #[command(subcommand)]
        action: ServiceAction,
    },
}

/// Arguments for `render`.
#[derive(clap::Args, Debug, Clone)]
pub(crate) struct RenderArgs {
    /// Template file to render.
    #[arg(long)]
    pub(crate) template: Utf8PathBuf,
    /// Interface address; classified from the host when omitted.
    #[arg(long)]
    pub(crate) interface: Option<Ipv4Addr>,
    /// Host name; read from the host when omitted.
    #[arg(long)]
    pub(crate) hostname: Option<String>,
    /// System role; classified from the host when omitted.
    #[arg(long, value_enum)]
    pub(crate) role: Option<RoleArg>,
}

/// Service lifecycle actions.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ServiceAction {
    /// Starts the service and waits until it runs.
    Start,
    /// Stops the service and waits until it stops.
    Stop,
    /// Prints the current service status.
    Status,
}

/// System role accepted on the command line.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub(crate) enum RoleArg {
    /// Client edition.
    Workstation,
    /// Domain controller.
    DomainController,
    /// Server edition.
    Server,
}

impl From<RoleArg> for SystemRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Workstation => Self::Workstation,
            RoleArg::DomainController => Self::DomainController,
            RoleArg::Server => Self::Server,
        }
    }
}
