//! Command-line runtime for `agent-provision`.
//!
//! The runtime splits configuration flags from the command, loads layered
//! configuration, installs telemetry, and dispatches to a command handler
//! with the operating system adapters. Configuration loading, adapters, and
//! IO streams can all be substituted in tests.

use std::ffi::OsString;
use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;

use clap::Parser;

use provision_config::Config;

mod cli;
mod commands;
mod config;
mod errors;
pub mod output;
mod platform;
mod telemetry;

use cli::Cli;
use config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};
pub(crate) use errors::AppError;
pub use output::{OutputFormat, ResolvedOutputFormat};
use output::CommandOutput;
use platform::SystemPlatform;

/// CLI flags recognised by the configuration loader.
///
/// MAINTENANCE: keep in sync with the fields of `provision_config::Config`.
const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--server",
    "--server-active",
    "--listen-port",
    "--enable-path",
    "--allow-key",
    "--host-metadata",
    "--proxy-server-address",
    "--primary-server-address",
    "--proxy-subnet-prefix",
    "--primary-subnet-prefix",
    "--service-name",
    "--installer-url-x64",
    "--installer-url-x86",
    "--template-url",
    "--agent-config-path",
    "--download-dir",
    "--poll-interval-secs",
    "--service-timeout-secs",
    "--download-timeout-secs",
    "--completion-delay-secs",
    "--log-filter",
    "--log-format",
];

/// Bundles the IO streams provided to the CLI runtime.
pub(crate) struct IoStreams<'a, W: Write, E: Write> {
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
    stdout_is_terminal: bool,
}

impl<'a, W: Write, E: Write> IoStreams<'a, W, E> {
    pub(crate) fn new(stdout: &'a mut W, stderr: &'a mut E) -> Self {
        Self {
            stdout,
            stderr,
            stdout_is_terminal: io::stdout().is_terminal(),
        }
    }

    #[cfg(test)]
    pub(crate) const fn with_terminal_status(
        stdout: &'a mut W,
        stderr: &'a mut E,
        stdout_is_terminal: bool,
    ) -> Self {
        Self {
            stdout,
            stderr,
            stdout_is_terminal,
        }
    }
}

struct CliRunner<'a, W: Write, E: Write, L: ConfigLoader> {
    io: &'a mut IoStreams<'a, W, E>,
    loader: &'a L,
}

impl<'a, W, E, L> CliRunner<'a, W, E, L>
where
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    const fn new(io: &'a mut IoStreams<'a, W, E>, loader: &'a L) -> Self {
        Self { io, loader }
    }

    fn run<I>(&mut self, args: I) -> ExitCode
    where
        I: IntoIterator<Item = OsString>,
    {
        self.run_with_platform(args, |config, cli, output| {
            let platform = SystemPlatform::new(config)?;
            commands::execute(cli.command, config, platform.collaborators(), output)
        })
    }

    fn run_with_platform<I, F>(&mut self, args: I, handler: F) -> ExitCode
    where
        I: IntoIterator<Item = OsString>,
        F: FnOnce(&Config, Cli, &mut CommandOutput<&mut W, &mut E>) -> Result<(), AppError>,
    {
        let args: Vec<OsString> = args.into_iter().collect();
        let split = split_config_arguments(&args);

        let result = Cli::try_parse_from(&split.command_arguments)
            .map_err(AppError::CliUsage)
            .and_then(|cli| {
                let config = self.loader.load(&split.config_arguments)?;
                telemetry::initialise(&config)?;
                let format = cli.output.resolve(self.io.stdout_is_terminal);
                let mut output =
                    CommandOutput::new(&mut *self.io.stdout, &mut *self.io.stderr, format);
                handler(&config, cli, &mut output)
            });

        match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(AppError::CliUsage(error)) if !error.use_stderr() => {
                let _ = write!(self.io.stdout, "{error}");
                ExitCode::SUCCESS
            }
            Err(error) => {
                let _ = writeln!(self.io.stderr, "{error}");
                ExitCode::FAILURE
            }
        }
    }
}

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let mut io = IoStreams::new(stdout, stderr);
    CliRunner::new(&mut io, &OrthoConfigLoader).run(args)
}

/// Runs the CLI against caller-supplied collaborators.
#[cfg(test)]
pub(crate) fn run_with_collaborators<'a, I, W, E, L>(
    args: I,
    io: &'a mut IoStreams<'a, W, E>,
    loader: &'a L,
    collaborators: provision_core::Collaborators<'_>,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    CliRunner::new(io, loader).run_with_platform(args, |config, cli, output| {
        commands::execute(cli.command, config, collaborators, output)
    })
}
