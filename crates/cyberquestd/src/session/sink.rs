//! Output sinks owned by a session's connection.

use std::io::Write;

use cyberquest_protocol::{ProtocolError, ServerMessage, write_message};
use thiserror::Error;

/// Failure to deliver output to the client. Ends the session.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Writing to the connection failed.
    #[error("failed to deliver output: {0}")]
    Delivery(#[from] ProtocolError),
    /// The sink was closed before the write.
    #[error("output sink closed")]
    Closed,
}

/// Capability to emit messages to exactly one connected client.
pub trait OutputSink {
    /// Appends raw text to the client's terminal surface.
    fn append_output(&mut self, text: &str) -> Result<(), SinkError>;

    /// Signals that the session accepts the next line.
    fn prompt_ready(&mut self, prompt: &str) -> Result<(), SinkError>;

    /// Asks the client to present a media link.
    fn show_media(&mut self, link: &str) -> Result<(), SinkError>;
}

/// Sink writing JSONL [`ServerMessage`]s to a stream.
pub struct JsonlSink<W> {
    writer: W,
}

impl<W: Write> JsonlSink<W> {
    /// Wraps a connection's write half.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the wrapped stream.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn send(&mut self, message: &ServerMessage) -> Result<(), SinkError> {
        write_message(&mut self.writer, message)?;
        Ok(())
    }
}

impl<W: Write> OutputSink for JsonlSink<W> {
    fn append_output(&mut self, text: &str) -> Result<(), SinkError> {
        self.send(&ServerMessage::output(text))
    }

    fn prompt_ready(&mut self, prompt: &str) -> Result<(), SinkError> {
        self.send(&ServerMessage::prompt_ready(prompt))
    }

    fn show_media(&mut self, link: &str) -> Result<(), SinkError> {
        self.send(&ServerMessage::show_media(link))
    }
}

/// In-memory sink used by tests to inspect what a session emitted.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    messages: Vec<ServerMessage>,
    fail_after: Option<usize>,
}

#[cfg(test)]
impl RecordingSink {
    /// A sink that rejects every write after `count` messages.
    pub(crate) fn failing_after(count: usize) -> Self {
        Self {
            messages: Vec::new(),
            fail_after: Some(count),
        }
    }

    pub(crate) fn messages(&self) -> &[ServerMessage] {
        &self.messages
    }

    /// Concatenated text of every output message.
    pub(crate) fn output(&self) -> String {
        self.messages
            .iter()
            .filter_map(|message| match message {
                ServerMessage::AppendOutput { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Output split into lines, line breaks removed.
    pub(crate) fn output_lines(&self) -> Vec<String> {
        self.output().split("\r\n").map(str::to_owned).collect()
    }

    pub(crate) fn prompts(&self) -> Vec<&str> {
        self.messages
            .iter()
            .filter_map(|message| match message {
                ServerMessage::PromptReady { prompt } => Some(prompt.as_str()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn media(&self) -> Vec<&str> {
        self.messages
            .iter()
            .filter_map(|message| match message {
                ServerMessage::ShowMedia { link } => Some(link.as_str()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn clear(&mut self) {
        self.messages.clear();
    }

    fn record(&mut self, message: ServerMessage) -> Result<(), SinkError> {
        if self
            .fail_after
            .is_some_and(|limit| self.messages.len() >= limit)
        {
            return Err(SinkError::Closed);
        }
        self.messages.push(message);
        Ok(())
    }
}

#[cfg(test)]
impl OutputSink for RecordingSink {
    fn append_output(&mut self, text: &str) -> Result<(), SinkError> {
        self.record(ServerMessage::output(text))
    }

    fn prompt_ready(&mut self, prompt: &str) -> Result<(), SinkError> {
        self.record(ServerMessage::prompt_ready(prompt))
    }

    fn show_media(&mut self, link: &str) -> Result<(), SinkError> {
        self.record(ServerMessage::show_media(link))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jsonl_sink_frames_each_message() {
        let mut sink = JsonlSink::new(Vec::new());
        sink.append_output("hello\r\n").expect("output");
        sink.prompt_ready("localhost> ").expect("prompt");

        let text = String::from_utf8(sink.into_inner()).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                r#"{"kind":"append_output","text":"hello\r\n"}"#,
                r#"{"kind":"prompt_ready","prompt":"localhost> "}"#,
            ]
        );
    }

    #[test]
    fn recording_sink_can_simulate_a_dropped_connection() {
        let mut sink = RecordingSink::failing_after(1);
        sink.append_output("first").expect("first write");

        let error = sink.append_output("second").expect_err("second write");
        assert!(matches!(error, SinkError::Closed));
        assert_eq!(sink.output(), "first");
    }
}
