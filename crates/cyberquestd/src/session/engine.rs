//! Drives one session from greeting to disconnect.

use std::sync::Arc;
use std::sync::mpsc::Receiver;

use cyberquest_config::Pacing;
use tracing::{debug, info};

use super::{InputGate, OutputSink, SESSION_TARGET, Session, SinkError};
use crate::dispatch::{CommandContext, CommandRegistry, DispatchOutcome, dispatch_line, emit_line};
use crate::world::World;

/// Runs sessions against a shared world and command registry.
///
/// The engine is cheap to clone; every connection gets its own copy.
#[derive(Debug, Clone)]
pub struct SessionEngine {
    world: Arc<World>,
    registry: Arc<CommandRegistry>,
    pacing: Pacing,
}

impl SessionEngine {
    /// An engine serving `world` with the commands in `registry`.
    #[must_use]
    pub fn new(world: Arc<World>, registry: Arc<CommandRegistry>, pacing: Pacing) -> Self {
        Self {
            world,
            registry,
            pacing,
        }
    }

    /// The world every session of this engine plays in.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Starts a session on the world's default host and greets the client
    /// with the banner and startup text.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when the greeting cannot be delivered.
    pub fn open(&self, sink: &mut dyn OutputSink) -> Result<Session, SinkError> {
        let mut session = Session::for_world(&self.world);
        let greeting = [self.world.banner(), self.world.startup_text()];
        {
            let mut context = self.context(&mut session, sink);
            for text in greeting.into_iter().flatten() {
                emit_line(&mut context, text)?;
            }
        }
        info!(
            target: SESSION_TARGET,
            host = session.current_host(),
            user = session.current_user().unwrap_or("-"),
            "session opened"
        );
        Ok(session)
    }

    /// Reopens the gate, then shows the prompt.
    ///
    /// The gate opens first so that a line submitted as soon as the client
    /// sees the prompt is never refused.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when the prompt cannot be delivered.
    pub fn ready(
        &self,
        session: &Session,
        sink: &mut dyn OutputSink,
        gate: &InputGate,
    ) -> Result<(), SinkError> {
        gate.reopen();
        sink.prompt_ready(&session.prompt())
    }

    /// Executes one submitted line to completion.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when output can no longer reach the client.
    pub fn handle_line(
        &self,
        session: &mut Session,
        sink: &mut dyn OutputSink,
        line: &str,
    ) -> Result<DispatchOutcome, SinkError> {
        let mut context = self.context(session, sink);
        let outcome = dispatch_line(&self.registry, &mut context, line)?;
        debug!(target: SESSION_TARGET, ?outcome, "line handled");
        Ok(outcome)
    }

    /// Runs a whole session: greeting, then one command per admitted line
    /// until `lines` closes.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when the client stops accepting output.
    pub fn serve(
        &self,
        sink: &mut dyn OutputSink,
        gate: &InputGate,
        lines: &Receiver<String>,
    ) -> Result<(), SinkError> {
        let mut session = self.open(sink)?;
        self.ready(&session, sink, gate)?;
        for line in lines {
            self.handle_line(&mut session, sink, &line)?;
            self.ready(&session, sink, gate)?;
        }
        debug!(target: SESSION_TARGET, "input closed");
        Ok(())
    }

    fn context<'a>(
        &'a self,
        session: &'a mut Session,
        sink: &'a mut dyn OutputSink,
    ) -> CommandContext<'a> {
        CommandContext::new(
            session,
            sink,
            &self.world,
            self.registry.names(),
            self.pacing,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use cyberquest_protocol::ServerMessage;

    use super::*;
    use crate::commands;
    use crate::session::RecordingSink;

    fn engine(world: World) -> SessionEngine {
        SessionEngine::new(
            Arc::new(world),
            Arc::new(commands::registry()),
            Pacing::Instant,
        )
    }

    #[test]
    fn greeting_precedes_the_first_prompt() {
        let engine = engine(
            World::new("gateway")
                .with_default_user("guest")
                .with_banner("CYBERQUEST v1")
                .with_startup_text("Welcome.\nType help."),
        );
        let mut sink = RecordingSink::default();
        let gate = InputGate::new();

        let session = engine.open(&mut sink).expect("open");
        engine.ready(&session, &mut sink, &gate).expect("ready");

        assert!(gate.is_ready());
        assert_eq!(
            sink.messages(),
            [
                ServerMessage::output("CYBERQUEST v1\r\n"),
                ServerMessage::output("Welcome.\r\nType help.\r\n"),
                ServerMessage::prompt_ready("guest@gateway> "),
            ]
        );
    }

    #[test]
    fn every_line_is_followed_by_a_prompt() {
        let engine = engine(World::default());
        let mut sink = RecordingSink::default();
        let gate = InputGate::new();
        let (sender, receiver) = mpsc::channel();
        for line in ["help", "nonsense", "connect {host: x"] {
            sender.send(line.to_owned()).expect("queue line");
        }
        drop(sender);

        engine.serve(&mut sink, &gate, &receiver).expect("serve");

        assert_eq!(sink.prompts(), ["localhost> "; 4]);
        assert!(matches!(
            sink.messages().last(),
            Some(ServerMessage::PromptReady { .. })
        ));
        assert!(sink.output().contains("Command nonsense not found!\r\n"));
        assert!(sink.output().contains("Expected matching }\r\n"));
    }

    #[test]
    fn prompt_follows_the_session_host() {
        let engine = engine(World::new("gateway").with_host("vault", Default::default()));
        let mut sink = RecordingSink::default();
        let gate = InputGate::new();

        let mut session = engine.open(&mut sink).expect("open");
        engine
            .handle_line(&mut session, &mut sink, "connect {host: 'vault'}")
            .expect("connect");
        engine.ready(&session, &mut sink, &gate).expect("ready");

        assert_eq!(sink.prompts(), ["vault> "]);
    }

    #[test]
    fn delivery_failure_ends_the_session() {
        let engine = engine(World::default().with_banner("hello"));
        let mut sink = RecordingSink::failing_after(0);
        let gate = InputGate::new();
        let (_sender, receiver) = mpsc::channel::<String>();

        let result = engine.serve(&mut sink, &gate, &receiver);

        assert!(matches!(result, Err(SinkError::Closed)));
        assert!(!gate.is_ready());
    }
}
