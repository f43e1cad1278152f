//! Failures that stop the server before or while it serves sessions.

use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::transport::ListenerError;

use super::shutdown::ShutdownError;

/// Why [`run_server`](super::run_server) returned an error.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration, logging or world loading failed.
    #[error("server bootstrap failed: {0}")]
    Bootstrap(#[from] BootstrapError),
    /// The listen socket could not be bound or its thread died.
    #[error("session listener failed: {0}")]
    Listener(#[from] ListenerError),
    /// The listener was stopped and joined before this is reported.
    #[error("failed to wait for shutdown: {0}")]
    Shutdown(#[from] ShutdownError),
}

impl LaunchError {
    /// The command-line error, when launch failed on argument parsing.
    #[must_use]
    pub fn as_cli(&self) -> Option<&clap::Error> {
        match self {
            Self::Bootstrap(source) => source.as_cli(),
            Self::Listener(_) | Self::Shutdown(_) => None,
        }
    }
}
