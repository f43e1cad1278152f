//! Socket transport helpers for the terminal client.
//!
//! Connections to the session server are wrapped in a uniform
//! [`Connection`] so the terminal loop stays transport agnostic.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use cyberquest_config::SocketEndpoint;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

#[cfg(unix)]
use socket2::{Domain, SockAddr, Socket, Type};

use crate::AppError;

pub(crate) const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub(crate) enum Connection {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Connection {
    /// A second handle on the same socket, used by the reader thread.
    pub(crate) fn try_clone(&self) -> io::Result<Self> {
        match self {
            Self::Tcp(stream) => stream.try_clone().map(Self::Tcp),
            #[cfg(unix)]
            Self::Unix(stream) => stream.try_clone().map(Self::Unix),
        }
    }

    /// Closes both directions, waking any blocked reader.
    pub(crate) fn shutdown(&self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.shutdown(Shutdown::Both),
            #[cfg(unix)]
            Self::Unix(stream) => stream.shutdown(Shutdown::Both),
        }
    }
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
        }
    }
}

/// Dials the server, giving up after [`CONNECTION_TIMEOUT`].
pub(crate) fn connect(endpoint: &SocketEndpoint) -> Result<Connection, AppError> {
    let failed = |source| AppError::Connect {
        endpoint: endpoint.to_string(),
        source,
    };
    match endpoint {
        SocketEndpoint::Tcp { host, port } => {
            let address = first_address(host, *port).map_err(|source| AppError::Resolve {
                endpoint: endpoint.to_string(),
                source,
            })?;
            TcpStream::connect_timeout(&address, CONNECTION_TIMEOUT)
                .map(Connection::Tcp)
                .map_err(failed)
        }
        #[cfg(unix)]
        SocketEndpoint::Unix { path } => dial_unix(path.as_str()).map_err(failed),
        #[cfg(not(unix))]
        SocketEndpoint::Unix { .. } => Err(AppError::UnsupportedUnixTransport(endpoint.to_string())),
    }
}

fn first_address(host: &str, port: u16) -> io::Result<SocketAddr> {
    (host, port).to_socket_addrs()?.next().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("{host}:{port} resolved to no addresses"),
        )
    })
}

/// `UnixStream` has no connect timeout of its own, so the socket is built
/// with `socket2` and converted.
#[cfg(unix)]
fn dial_unix(path: &str) -> io::Result<Connection> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    socket.connect_timeout(&SockAddr::unix(path)?, CONNECTION_TIMEOUT)?;
    Ok(Connection::Unix(UnixStream::from(socket)))
}
