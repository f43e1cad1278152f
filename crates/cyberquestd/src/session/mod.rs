//! Per-connection session state and the engine that drives it.
//!
//! A [`Session`] records where the player currently is. The
//! [`SessionEngine`] runs the connection lifecycle: greet the client, then
//! alternate between Ready (prompt shown, one line admitted through the
//! [`InputGate`]) and Executing (the line's command runs to completion).

mod connection;
mod engine;
mod gate;
mod sink;

pub(crate) use self::connection::SessionConnectionHandler;
pub use self::engine::SessionEngine;
pub use self::gate::InputGate;
#[cfg(test)]
pub(crate) use self::sink::RecordingSink;
pub use self::sink::{JsonlSink, OutputSink, SinkError};

use crate::world::World;

pub(crate) const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

/// Where a connected player currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    current_host: String,
    current_user: Option<String>,
}

impl Session {
    /// A session on `host`, logged in as `user` when given.
    #[must_use]
    pub fn new(host: impl Into<String>, user: Option<String>) -> Self {
        Self {
            current_host: host.into(),
            current_user: user,
        }
    }

    /// A session positioned on the world's default host and user.
    #[must_use]
    pub fn for_world(world: &World) -> Self {
        Self::new(world.default_host(), world.default_user().map(str::to_owned))
    }

    /// Identifier of the host the player is on.
    #[must_use]
    pub fn current_host(&self) -> &str {
        &self.current_host
    }

    /// Account the player is logged in as, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<&str> {
        self.current_user.as_deref()
    }

    /// Moves the session to another host, replacing the logged-in user.
    pub fn connect_to(&mut self, host: impl Into<String>, user: Option<String>) {
        self.current_host = host.into();
        self.current_user = user;
    }

    /// Prompt text: `[<user>@]<host>> `.
    #[must_use]
    pub fn prompt(&self) -> String {
        match &self.current_user {
            Some(user) => format!("{user}@{}> ", self.current_host),
            None => format!("{}> ", self.current_host),
        }
    }
}
