//! Terminal client entrypoint.
//!
//! Delegates to [`cyberquest_cli::run`], which resolves configuration,
//! connects to the session server and drives the interactive terminal.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    cyberquest_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
