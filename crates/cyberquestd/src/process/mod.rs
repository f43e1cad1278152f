//! Process lifecycle: bootstrap, listen, wait for a termination signal, stop.

mod errors;
mod launch;
mod shutdown;

pub use errors::LaunchError;
pub use launch::run_server;
pub(crate) use launch::{LaunchPlan, ServiceDeps, run_server_with};
pub use shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
