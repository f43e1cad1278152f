//! Listen endpoint shared by the server and the terminal client.
//!
//! Endpoints are written as URLs: `tcp://host[:port]` or `unix:///path`. A
//! bare `host:port` is accepted as shorthand for TCP.

use std::fmt;
use std::fs::DirBuilder;
use std::io;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::defaults::DEFAULT_TCP_PORT;

/// Address the session server listens on and the terminal client dials.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum SocketEndpoint {
    /// A TCP address, resolved when binding or dialling.
    Tcp {
        /// Host name or IP literal.
        host: String,
        /// Port number; `0` lets the OS choose when binding.
        port: u16,
    },
    /// A Unix domain socket file.
    Unix {
        /// Location of the socket file.
        path: Utf8PathBuf,
    },
}

impl SocketEndpoint {
    /// Builds a TCP endpoint.
    #[must_use]
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    /// Builds a Unix socket endpoint.
    #[must_use]
    pub fn unix(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }

    /// Socket file path, for Unix endpoints only.
    #[must_use]
    pub fn unix_path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Unix { path } => Some(path),
            Self::Tcp { .. } => None,
        }
    }

    /// Creates the directory that will hold a Unix socket file.
    ///
    /// The directory is created owner-only on Unix. TCP endpoints and socket
    /// paths relative to the working directory need nothing.
    ///
    /// # Errors
    ///
    /// Returns [`SocketPreparationError`] when the directory cannot be
    /// created.
    pub fn prepare_filesystem(&self) -> Result<(), SocketPreparationError> {
        let Some(directory) = self
            .unix_path()
            .and_then(Utf8Path::parent)
            .filter(|parent| !parent.as_str().is_empty())
        else {
            return Ok(());
        };

        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        std::os::unix::fs::DirBuilderExt::mode(&mut builder, 0o700);

        match builder.create(directory.as_std_path()) {
            Err(source) if source.kind() != io::ErrorKind::AlreadyExists => {
                Err(SocketPreparationError {
                    directory: directory.to_path_buf(),
                    source,
                })
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for SocketEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp { host, port } => write!(f, "tcp://{host}:{port}"),
            Self::Unix { path } => write!(f, "unix://{path}"),
        }
    }
}

impl FromStr for SocketEndpoint {
    type Err = SocketParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if !input.contains("://") {
            return parse_tcp_shorthand(input);
        }
        let url = Url::parse(input).map_err(|source| SocketParseError::Malformed {
            input: input.to_owned(),
            source,
        })?;
        match url.scheme() {
            "tcp" => {
                let host = url
                    .host_str()
                    .filter(|host| !host.is_empty())
                    .ok_or_else(|| SocketParseError::MissingHost(input.to_owned()))?;
                Ok(Self::tcp(host, url.port().unwrap_or(DEFAULT_TCP_PORT)))
            }
            "unix" => match url.path() {
                "" | "/" => Err(SocketParseError::MissingUnixPath(input.to_owned())),
                path => Ok(Self::unix(path)),
            },
            scheme => Err(SocketParseError::UnsupportedScheme(scheme.to_owned())),
        }
    }
}

fn parse_tcp_shorthand(input: &str) -> Result<SocketEndpoint, SocketParseError> {
    let Some((host, port)) = input.rsplit_once(':') else {
        return Err(SocketParseError::MissingScheme(input.to_owned()));
    };
    if host.is_empty() {
        return Err(SocketParseError::MissingHost(input.to_owned()));
    }
    let port = port
        .parse()
        .map_err(|_| SocketParseError::InvalidPort(input.to_owned()))?;
    Ok(SocketEndpoint::tcp(host, port))
}

/// Why a listen endpoint string was rejected.
#[derive(Debug, Error)]
pub enum SocketParseError {
    /// Neither a URL nor `host:port`.
    #[error("endpoint '{0}' needs a tcp:// or unix:// scheme")]
    MissingScheme(String),
    /// Schemes other than `tcp` and `unix`.
    #[error("unsupported endpoint scheme '{0}'")]
    UnsupportedScheme(String),
    /// A TCP endpoint without a host.
    #[error("endpoint '{0}' names no host")]
    MissingHost(String),
    /// The port is not a number in range.
    #[error("endpoint '{0}' has an invalid port")]
    InvalidPort(String),
    /// A Unix endpoint without a path.
    #[error("endpoint '{0}' names no socket path")]
    MissingUnixPath(String),
    /// The URL itself could not be parsed.
    #[error("malformed endpoint '{input}': {source}")]
    Malformed {
        /// Text that was rejected.
        input: String,
        /// Parser diagnostic.
        #[source]
        source: url::ParseError,
    },
}

/// The socket directory could not be created.
#[derive(Debug, Error)]
#[error("failed to create socket directory '{directory}': {source}")]
pub struct SocketPreparationError {
    /// Directory that could not be created.
    pub directory: Utf8PathBuf,
    /// Underlying filesystem error.
    #[source]
    pub source: io::Error,
}
