//! Socket transport for terminal sessions.
//!
//! The listener binds the configured TCP or Unix endpoint, accepts in a
//! background thread and hands every connection to a [`ConnectionHandler`].

mod errors;
mod handler;
mod listener;

pub(crate) use self::errors::ListenerError;
pub(crate) use self::handler::{ConnectionHandler, ConnectionStream};
pub(crate) use self::listener::{ListenerHandle, SocketListener};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
