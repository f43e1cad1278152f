//! Terminal client for the CyberQuest session server.
//!
//! The client resolves the same configuration as the server, dials its
//! endpoint and hands the terminal to a raw-mode loop. Typed keys are edited
//! locally by [`LineEditor`]; only committed lines travel to the server, and
//! the server's output is written back verbatim.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use cyberquest_config::Config;

pub mod editor;
mod errors;
mod session;
mod terminal;
mod transport;

pub use editor::{EditorOutput, Key, KeyPress, LineEditor};
pub(crate) use errors::AppError;

/// Exit status used by clap for usage errors.
const USAGE_EXIT: u8 = 2;
const FAILURE_EXIT: u8 = 1;

/// Runs the client with explicit arguments and output streams.
///
/// `stdout` receives the session itself as well as help output; `stderr`
/// receives diagnostics.
pub fn run<I, T, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    W: Write,
    E: Write,
{
    ExitCode::from(exit_status(args, stdout, stderr))
}

fn exit_status<I, T, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    W: Write,
    E: Write,
{
    let config = match Config::load_from_iter(args) {
        Ok(config) => config,
        Err(error) => {
            if let Some(cli) = error.as_cli() {
                return report_usage(cli, stdout, stderr);
            }
            return report(&AppError::LoadConfiguration(error), stderr);
        }
    };

    match connect_and_run(&config, stdout) {
        Ok(()) => 0,
        Err(error) => report(&error, stderr),
    }
}

fn connect_and_run<W: Write>(config: &Config, stdout: &mut W) -> Result<(), AppError> {
    let mut connection = transport::connect(config.listen())?;
    terminal::run_session(&mut connection, stdout)
}

fn report_usage<W: Write, E: Write>(error: &clap::Error, stdout: &mut W, stderr: &mut E) -> u8 {
    let rendered = error.render();
    let (written, status) = if error.use_stderr() {
        (write!(stderr, "{rendered}"), USAGE_EXIT)
    } else {
        (write!(stdout, "{rendered}"), 0)
    };
    if written.is_err() {
        return FAILURE_EXIT;
    }
    status
}

fn report<E: Write>(error: &AppError, stderr: &mut E) -> u8 {
    if writeln!(stderr, "cyberquest: {error}").is_err() {
        return USAGE_EXIT;
    }
    FAILURE_EXIT
}
