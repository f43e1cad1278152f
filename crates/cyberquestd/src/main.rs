//! `cyberquestd` binary: serves CyberQuest terminal sessions until signalled.

use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match cyberquestd::run_server() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if let Some(cli) = error.as_cli() {
                cli.exit();
            }
            let mut stderr = io::stderr().lock();
            if writeln!(stderr, "cyberquestd: {error}").is_err() {
                return ExitCode::from(2);
            }
            ExitCode::FAILURE
        }
    }
}
