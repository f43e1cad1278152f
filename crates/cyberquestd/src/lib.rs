//! Session server for the CyberQuest remote terminal.
//!
//! Players connect with the terminal client and type commands at a prompt as
//! if they were logged into a remote machine. The server owns all game state:
//! each connection gets a [`session::Session`] positioned on a host of the
//! shared, read-only [`world::World`], and every submitted line is run through
//! the [`dispatch`] layer against the built-in [`commands`].
//!
//! A session alternates between two states. In Ready the prompt is shown and
//! exactly one submitted line is admitted; in Executing that line's command
//! runs to completion, possibly for seconds while paced output trickles out.
//! Lines arriving while Executing are dropped. Every command, successful or
//! not, ends with a fresh prompt.
//!
//! The process side follows the usual shape: [`bootstrap_with`] loads
//! configuration, initialises telemetry and loads the world, then
//! [`run_server`] listens until a termination signal arrives.

mod bootstrap;
pub mod commands;
pub mod dispatch;
mod health;
pub mod playback;
mod process;
pub mod session;
mod telemetry;
mod transport;
pub mod world;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Server, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_server};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
