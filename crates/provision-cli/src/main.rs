//! Binary entry point for `agent-provision`.
//!
//! Delegates to [`provision_cli::run`], which loads configuration, installs
//! telemetry, and dispatches the requested command.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    provision_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
