//! Listener accepting terminal client connections.
//!
//! Each accepted connection is served on its own thread, so a slow command in
//! one session never stalls another. The accept loop polls a non-blocking
//! socket so that [`ListenerHandle::shutdown`] takes effect within one
//! backoff interval.

use std::io;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use cyberquest_config::SocketEndpoint;

use super::{ConnectionHandler, ConnectionStream, LISTENER_TARGET, ListenerError};

#[cfg(unix)]
use self::unix_socket::UnixSocketFile;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);
const SESSION_THREAD_PREFIX: &str = "session";
const ACCEPT_THREAD_NAME: &str = "session-listener";

/// Listener bound to the configured endpoint, not yet accepting.
#[derive(Debug)]
pub(crate) struct SocketListener {
    endpoint: SocketEndpoint,
    acceptor: Acceptor,
}

#[derive(Debug)]
enum Acceptor {
    Tcp(TcpListener),
    /// Removes its socket file when dropped.
    #[cfg(unix)]
    Unix(UnixSocketFile),
}

impl Acceptor {
    fn set_nonblocking(&self) -> io::Result<()> {
        match self {
            Self::Tcp(listener) => listener.set_nonblocking(true),
            #[cfg(unix)]
            Self::Unix(socket) => socket.listener().set_nonblocking(true),
        }
    }

    /// Accepts one pending connection. `Ok(None)` means nothing is waiting.
    fn accept(&self) -> io::Result<Option<ConnectionStream>> {
        let accepted = match self {
            Self::Tcp(listener) => listener.accept().and_then(|(stream, _)| {
                stream.set_nonblocking(false)?;
                Ok(ConnectionStream::Tcp(stream))
            }),
            #[cfg(unix)]
            Self::Unix(socket) => socket.listener().accept().and_then(|(stream, _)| {
                stream.set_nonblocking(false)?;
                Ok(ConnectionStream::Unix(stream))
            }),
        };
        match accepted {
            Ok(stream) => Ok(Some(stream)),
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(error) => Err(error),
        }
    }
}

impl SocketListener {
    pub(crate) fn bind(endpoint: &SocketEndpoint) -> Result<Self, ListenerError> {
        let acceptor = match endpoint {
            SocketEndpoint::Tcp { host, port } => Acceptor::Tcp(bind_tcp(host, *port)?),
            #[cfg(unix)]
            SocketEndpoint::Unix { path } => Acceptor::Unix(UnixSocketFile::bind(path)?),
            #[cfg(not(unix))]
            SocketEndpoint::Unix { .. } => {
                return Err(ListenerError::UnsupportedUnix {
                    endpoint: endpoint.to_string(),
                });
            }
        };
        Ok(Self {
            endpoint: endpoint.clone(),
            acceptor,
        })
    }

    #[cfg(test)]
    pub(crate) fn local_addr(&self) -> Option<SocketAddr> {
        match &self.acceptor {
            Acceptor::Tcp(listener) => listener.local_addr().ok(),
            #[cfg(unix)]
            Acceptor::Unix(_) => None,
        }
    }

    /// Starts the accept thread. Dropping the listener on any failure
    /// releases the endpoint again.
    pub(crate) fn start(
        self,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<ListenerHandle, ListenerError> {
        self.acceptor
            .set_nonblocking()
            .map_err(|source| ListenerError::NonBlocking { source })?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let accept_loop = AcceptLoop {
            listener: self,
            shutdown: Arc::clone(&shutdown),
            handler,
            accepted: 0,
        };
        let handle = thread::Builder::new()
            .name(ACCEPT_THREAD_NAME.to_owned())
            .spawn(move || accept_loop.run())
            .map_err(|source| ListenerError::SpawnAcceptor { source })?;
        Ok(ListenerHandle {
            shutdown,
            handle: Some(handle),
        })
    }
}

/// Handle to the background accept thread.
pub(crate) struct ListenerHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    /// Stops accepting. Sessions already running finish on their own.
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    pub(crate) fn join(mut self) -> Result<(), ListenerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| ListenerError::ThreadPanic),
            None => Ok(()),
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

struct AcceptLoop {
    listener: SocketListener,
    shutdown: Arc<AtomicBool>,
    handler: Arc<dyn ConnectionHandler>,
    accepted: u64,
}

impl AcceptLoop {
    fn run(mut self) {
        info!(
            target: LISTENER_TARGET,
            endpoint = %self.listener.endpoint,
            "session listener active"
        );
        let mut last_error = None::<io::ErrorKind>;
        while !self.shutdown.load(Ordering::SeqCst) {
            match self.listener.acceptor.accept() {
                Ok(Some(stream)) => {
                    last_error = None;
                    self.accepted += 1;
                    self.spawn_session(stream);
                }
                Ok(None) => thread::sleep(ACCEPT_BACKOFF),
                Err(error) => {
                    // Repeats of the same failure are logged once.
                    if last_error != Some(error.kind()) {
                        warn!(target: LISTENER_TARGET, %error, "socket accept error");
                    }
                    last_error = Some(error.kind());
                    thread::sleep(ERROR_BACKOFF);
                }
            }
        }
        info!(
            target: LISTENER_TARGET,
            accepted = self.accepted,
            "session listener stopped"
        );
    }

    fn spawn_session(&self, stream: ConnectionStream) {
        let id = self.accepted;
        debug!(target: LISTENER_TARGET, session = id, peer = ?stream, "connection accepted");
        let handler = Arc::clone(&self.handler);
        let spawned = thread::Builder::new()
            .name(format!("{SESSION_THREAD_PREFIX}-{id}"))
            .spawn(move || handler.handle(stream));
        if let Err(error) = spawned {
            warn!(
                target: LISTENER_TARGET,
                session = id,
                %error,
                "failed to spawn session thread"
            );
        }
    }
}

fn bind_tcp(host: &str, port: u16) -> Result<TcpListener, ListenerError> {
    let addr: SocketAddr = (host, port)
        .to_socket_addrs()
        .map_err(|source| ListenerError::Resolve {
            host: host.to_owned(),
            port,
            source,
        })?
        .next()
        .ok_or_else(|| ListenerError::ResolveEmpty {
            host: host.to_owned(),
            port,
        })?;
    TcpListener::bind(addr).map_err(|source| ListenerError::BindTcp { addr, source })
}

#[cfg(unix)]
mod unix_socket {
    use std::fs;
    use std::io;
    use std::os::unix::fs::FileTypeExt;
    use std::os::unix::net::{UnixListener, UnixStream};

    use camino::{Utf8Path, Utf8PathBuf};
    use tracing::{debug, warn};

    use super::super::{LISTENER_TARGET, ListenerError};

    /// A bound Unix listener that owns its socket file.
    #[derive(Debug)]
    pub(super) struct UnixSocketFile {
        listener: UnixListener,
        path: Utf8PathBuf,
    }

    impl UnixSocketFile {
        /// Binds `path`, replacing a stale socket left by a dead server.
        pub(super) fn bind(path: &Utf8Path) -> Result<Self, ListenerError> {
            clear_stale_socket(path)?;
            let listener =
                UnixListener::bind(path.as_std_path()).map_err(|source| ListenerError::BindUnix {
                    path: path.to_string(),
                    source,
                })?;
            Ok(Self {
                listener,
                path: path.to_path_buf(),
            })
        }

        pub(super) fn listener(&self) -> &UnixListener {
            &self.listener
        }
    }

    impl Drop for UnixSocketFile {
        fn drop(&mut self) {
            if let Err(error) = fs::remove_file(self.path.as_std_path())
                && error.kind() != io::ErrorKind::NotFound
            {
                warn!(
                    target: LISTENER_TARGET,
                    %error,
                    path = %self.path,
                    "failed to remove unix socket file"
                );
            }
        }
    }

    /// Removes `path` when it is a socket nobody answers on.
    fn clear_stale_socket(path: &Utf8Path) -> Result<(), ListenerError> {
        let metadata = match fs::symlink_metadata(path.as_std_path()) {
            Ok(metadata) => metadata,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(source) => {
                return Err(ListenerError::UnixMetadata {
                    path: path.to_string(),
                    source,
                });
            }
        };
        if !metadata.file_type().is_socket() {
            return Err(ListenerError::UnixNotSocket {
                path: path.to_string(),
            });
        }

        match UnixStream::connect(path.as_std_path()) {
            Ok(_live) => Err(ListenerError::UnixInUse {
                path: path.to_string(),
            }),
            Err(error)
                if matches!(
                    error.kind(),
                    io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound
                ) =>
            {
                debug!(target: LISTENER_TARGET, %path, "removing stale unix socket");
                fs::remove_file(path.as_std_path()).map_err(|source| ListenerError::UnixCleanup {
                    path: path.to_string(),
                    source,
                })
            }
            Err(source) => Err(ListenerError::UnixConnect {
                path: path.to_string(),
                source,
            }),
        }
    }
}
