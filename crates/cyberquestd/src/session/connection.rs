//! Binds a session engine to an accepted socket.

use std::sync::mpsc::{self, Sender};
use std::thread;

use cyberquest_protocol::{ClientMessage, LineReader, ProtocolError};
use tracing::{debug, info, warn};

use super::{InputGate, JsonlSink, SESSION_TARGET, SessionEngine};
use crate::transport::{ConnectionHandler, ConnectionStream};

/// Serves one session per accepted connection.
///
/// A reader thread decodes submitted lines and passes them through the
/// session's [`InputGate`]; the connection thread runs the engine.
#[derive(Debug)]
pub(crate) struct SessionConnectionHandler {
    engine: SessionEngine,
}

impl SessionConnectionHandler {
    pub(crate) fn new(engine: SessionEngine) -> Self {
        Self { engine }
    }
}

impl ConnectionHandler for SessionConnectionHandler {
    fn handle(&self, stream: ConnectionStream) {
        let input = match stream.try_clone() {
            Ok(input) => input,
            Err(error) => {
                warn!(target: SESSION_TARGET, %error, "failed to split connection stream");
                return;
            }
        };

        let gate = InputGate::new();
        let (sender, receiver) = mpsc::channel();
        let reader = {
            let gate = gate.clone();
            thread::spawn(move || forward_lines(input, &gate, &sender))
        };

        let mut sink = JsonlSink::new(stream);
        match self.engine.serve(&mut sink, &gate, &receiver) {
            Ok(()) => info!(target: SESSION_TARGET, "session closed by client"),
            Err(error) => info!(target: SESSION_TARGET, %error, "session ended"),
        }

        if let Err(error) = sink.into_inner().shutdown() {
            debug!(target: SESSION_TARGET, %error, "connection already closed");
        }
        if reader.join().is_err() {
            warn!(target: SESSION_TARGET, "session reader panicked");
        }
    }
}

/// Decodes client messages until the stream ends, admitting at most one line
/// per prompt.
fn forward_lines(stream: ConnectionStream, gate: &InputGate, lines: &Sender<String>) {
    let mut reader = LineReader::new(stream);
    loop {
        match reader.read_message::<ClientMessage>() {
            Ok(Some(ClientMessage::SubmitLine { text })) => {
                if !gate.try_admit() {
                    debug!(target: SESSION_TARGET, line = %text, "line dropped while executing");
                    continue;
                }
                if lines.send(text).is_err() {
                    return;
                }
            }
            Ok(None) => return,
            Err(error @ ProtocolError::Malformed(_)) => {
                warn!(target: SESSION_TARGET, %error, "ignoring malformed client message");
            }
            Err(error) => {
                warn!(target: SESSION_TARGET, %error, "closing connection after read failure");
                return;
            }
        }
    }
}
