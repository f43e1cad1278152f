//! The capability object handed to every command handler.

use cyberquest_config::Pacing;

use crate::session::{OutputSink, Session};
use crate::world::{HostRecord, World};

use super::CommandError;

/// Line terminator sent to the terminal.
pub const LINE_BREAK: &str = "\r\n";

/// Everything a handler may touch while it runs: the caller's session, its
/// output sink, the shared world and the registered command names.
pub struct CommandContext<'a> {
    session: &'a mut Session,
    sink: &'a mut dyn OutputSink,
    world: &'a World,
    command_names: &'a [String],
    pacing: Pacing,
}

impl<'a> CommandContext<'a> {
    /// Assembles the context for one dispatched line.
    pub fn new(
        session: &'a mut Session,
        sink: &'a mut dyn OutputSink,
        world: &'a World,
        command_names: &'a [String],
        pacing: Pacing,
    ) -> Self {
        Self {
            session,
            sink,
            world,
            command_names,
            pacing,
        }
    }

    /// Writes text without a trailing line break.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Output`] when the client is gone.
    pub fn write(&mut self, text: &str) -> Result<(), CommandError> {
        if text.is_empty() {
            return Ok(());
        }
        self.sink.append_output(&normalise_line_breaks(text))?;
        Ok(())
    }

    /// Writes text followed by a line break.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Output`] when the client is gone.
    pub fn write_line(&mut self, text: &str) -> Result<(), CommandError> {
        let mut line = normalise_line_breaks(text);
        line.push_str(LINE_BREAK);
        self.sink.append_output(&line)?;
        Ok(())
    }

    /// Asks the client to open a media panel.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Output`] when the client is gone.
    pub fn show_media(&mut self, link: &str) -> Result<(), CommandError> {
        self.sink.show_media(link)?;
        Ok(())
    }

    /// Paces output the way a slow remote link would.
    pub fn pause(&self, millis: u64) {
        self.pacing.pause_millis(millis);
    }

    /// The shared world content.
    #[must_use]
    pub fn world(&self) -> &'a World {
        self.world
    }

    /// The caller's session.
    #[must_use]
    pub fn session(&self) -> &Session {
        self.session
    }

    /// The caller's session, for commands that move it.
    pub fn session_mut(&mut self) -> &mut Session {
        self.session
    }

    /// Record for the host the session is on. `None` if the content omits it.
    #[must_use]
    pub fn current_host(&self) -> Option<&'a HostRecord> {
        self.world.host(self.session.current_host())
    }

    /// Names of every registered command, sorted.
    #[must_use]
    pub fn command_names(&self) -> &'a [String] {
        self.command_names
    }
}

/// Converts `\n`, `\r` and `\r\n` to the terminal's `\r\n`.
pub(crate) fn normalise_line_breaks(text: &str) -> String {
    let mut normalised = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                normalised.push_str(LINE_BREAK);
            }
            '\n' => normalised.push_str(LINE_BREAK),
            other => normalised.push(other),
        }
    }
    normalised
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::session::RecordingSink;

    #[rstest]
    #[case("plain", "plain")]
    #[case("a\nb", "a\r\nb")]
    #[case("a\r\nb\rc", "a\r\nb\r\nc")]
    fn normalises_line_breaks(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalise_line_breaks(input), expected);
    }

    #[test]
    fn write_line_terminates_with_crlf() {
        let world = World::default();
        let mut session = Session::for_world(&world);
        let mut sink = RecordingSink::default();
        let names = Vec::new();
        let mut context =
            CommandContext::new(&mut session, &mut sink, &world, &names, Pacing::Instant);

        context.write("no break").expect("write");
        context.write_line("").expect("blank line");
        context.write_line("multi\nline").expect("write line");

        assert_eq!(sink.output(), "no break\r\nmulti\r\nline\r\n");
    }
}
