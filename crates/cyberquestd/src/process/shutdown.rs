//! Waiting for the process to be asked to stop.

use std::io;

use signal_hook::consts::{SIGHUP, TERM_SIGNALS};
use signal_hook::iterator::Signals;
use signal_hook::low_level::signal_name;
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

/// Blocks the launching thread until the server should stop.
pub trait ShutdownSignal: Send + Sync {
    /// Returns once shutdown was requested.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] when the wait itself cannot be set up.
    fn wait(&self) -> Result<(), ShutdownError>;
}

/// The shutdown wait could not be armed.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Signal handlers could not be installed.
    #[error("failed to register termination signals: {0}")]
    Register(#[source] io::Error),
}

/// Stops on SIGTERM, SIGINT, SIGQUIT or SIGHUP.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl SystemShutdownSignal {
    /// A waiter on the process's termination signals.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let watched = TERM_SIGNALS.iter().copied().chain([SIGHUP]);
        let mut signals = Signals::new(watched).map_err(ShutdownError::Register)?;
        let received = signals.forever().next();
        info!(
            target: PROCESS_TARGET,
            signal = received.and_then(signal_name).unwrap_or("unknown"),
            "stopping on signal"
        );
        Ok(())
    }
}
