//! Error types for the terminal client runtime.

use std::io;

use cyberquest_config::ConfigError;
use cyberquest_protocol::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(#[from] ConfigError),
    #[error("failed to resolve server address {endpoint}: {source}")]
    Resolve { endpoint: String, source: io::Error },
    #[error("failed to connect to server at {endpoint}: {source}")]
    Connect { endpoint: String, source: io::Error },
    #[cfg(not(unix))]
    #[error("platform does not support Unix sockets: {0}")]
    UnsupportedUnixTransport(String),
    #[error("failed to prepare the connection: {0}")]
    SplitConnection(io::Error),
    #[error("terminal I/O failed: {0}")]
    Terminal(io::Error),
    #[error("failed to send line to server: {0}")]
    SendLine(ProtocolError),
}
