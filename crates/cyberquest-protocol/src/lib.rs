//! Wire messages exchanged between the terminal client and the session server.
//!
//! Every message is a single JSON object on its own line (JSONL), tagged by a
//! `kind` field. The client only ever submits committed lines; the server
//! streams output, announces when it is ready for the next line, and asks the
//! client to surface media links.

use std::io::{self, BufRead, BufReader, Read, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum size of a single message line in bytes, newline included.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Messages sent from the terminal client to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClientMessage {
    /// A line committed by the remote line editor.
    SubmitLine {
        /// Line contents without the terminating newline.
        text: String,
    },
}

impl ClientMessage {
    /// Builds a submit message for a committed line.
    pub fn submit(text: impl Into<String>) -> Self {
        Self::SubmitLine { text: text.into() }
    }
}

/// Messages sent from the server to the terminal client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Raw text to append to the terminal surface.
    AppendOutput {
        /// Text written verbatim, line breaks included.
        text: String,
    },
    /// The server finished a command and accepts input again.
    PromptReady {
        /// Prompt text the client shows before the next line.
        prompt: String,
    },
    /// Ask the client to present a media link to the user.
    ShowMedia {
        /// Link to the media resource.
        link: String,
    },
}

impl ServerMessage {
    /// Creates an output message.
    pub fn output(text: impl Into<String>) -> Self {
        Self::AppendOutput { text: text.into() }
    }

    /// Creates a prompt-ready message.
    pub fn prompt_ready(prompt: impl Into<String>) -> Self {
        Self::PromptReady {
            prompt: prompt.into(),
        }
    }

    /// Creates a media message.
    pub fn show_media(link: impl Into<String>) -> Self {
        Self::ShowMedia { link: link.into() }
    }
}

/// Errors raised while framing or parsing protocol messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Underlying stream failed.
    #[error("protocol I/O failed: {0}")]
    Io(#[from] io::Error),
    /// A line was not a valid message.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The peer sent an empty line.
    #[error("empty message line")]
    Empty,
    /// The peer sent a line longer than [`MAX_LINE_BYTES`].
    #[error("message line exceeds {limit} bytes")]
    LineTooLong {
        /// Configured byte limit.
        limit: usize,
    },
}

/// Serialises `message` as one JSONL line and flushes the writer.
///
/// # Errors
///
/// Returns [`ProtocolError`] when serialisation or the write fails.
pub fn write_message<W, M>(writer: &mut W, message: &M) -> Result<(), ProtocolError>
where
    W: Write + ?Sized,
    M: Serialize,
{
    serde_json::to_writer(&mut *writer, message)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Parses one JSONL line into a message.
///
/// Trailing whitespace, including the newline delimiter, is ignored.
///
/// # Errors
///
/// Returns [`ProtocolError::Empty`] for blank lines and
/// [`ProtocolError::Malformed`] when the JSON does not match the schema.
pub fn parse_message<'de, M>(line: &'de [u8]) -> Result<M, ProtocolError>
where
    M: Deserialize<'de>,
{
    let trimmed = trim_trailing_whitespace(line);
    if trimmed.is_empty() {
        return Err(ProtocolError::Empty);
    }
    Ok(serde_json::from_slice(trimmed)?)
}

fn trim_trailing_whitespace(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |pos| pos + 1);
    bytes.get(..end).unwrap_or_default()
}

/// Reads newline-delimited messages while enforcing [`MAX_LINE_BYTES`].
pub struct LineReader<R> {
    inner: BufReader<R>,
    limit: usize,
}

impl<R: Read> LineReader<R> {
    /// Wraps `reader` with the default line limit.
    pub fn new(reader: R) -> Self {
        Self::with_limit(reader, MAX_LINE_BYTES)
    }

    /// Wraps `reader` with an explicit line limit.
    pub fn with_limit(reader: R, limit: usize) -> Self {
        Self {
            inner: BufReader::new(reader),
            limit,
        }
    }

    /// Reads the next raw line, newline excluded.
    ///
    /// Returns `Ok(None)` on a clean end of stream. A final line without a
    /// newline is still returned.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::LineTooLong`] once a line grows past the
    /// limit, or [`ProtocolError::Io`] when the stream fails.
    pub fn read_line(&mut self) -> Result<Option<Vec<u8>>, ProtocolError> {
        let mut buffer = Vec::new();
        loop {
            let available = match self.inner.fill_buf() {
                Ok(bytes) => bytes,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => return Err(error.into()),
            };
            if available.is_empty() {
                return Ok((!buffer.is_empty()).then_some(buffer));
            }

            if let Some(newline) = available.iter().position(|b| *b == b'\n') {
                buffer.extend_from_slice(available.get(..newline).unwrap_or_default());
                self.inner.consume(newline + 1);
                self.enforce_limit(buffer.len())?;
                return Ok(Some(buffer));
            }

            let consumed = available.len();
            buffer.extend_from_slice(available);
            self.inner.consume(consumed);
            self.enforce_limit(buffer.len())?;
        }
    }

    /// Reads and parses the next message, skipping blank lines.
    ///
    /// # Errors
    ///
    /// See [`LineReader::read_line`] and [`parse_message`].
    pub fn read_message<M>(&mut self) -> Result<Option<M>, ProtocolError>
    where
        M: for<'de> Deserialize<'de>,
    {
        loop {
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            match parse_message(&line) {
                Ok(message) => return Ok(Some(message)),
                Err(ProtocolError::Empty) => {}
                Err(error) => return Err(error),
            }
        }
    }

    fn enforce_limit(&self, size: usize) -> Result<(), ProtocolError> {
        if size > self.limit {
            return Err(ProtocolError::LineTooLong { limit: self.limit });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rstest::rstest;

    use super::*;

    #[test]
    fn submit_line_uses_kind_tag() {
        let mut output = Vec::new();
        write_message(&mut output, &ClientMessage::submit("files.list")).expect("write");

        let text = String::from_utf8(output).expect("utf8");
        assert_eq!(text, "{\"kind\":\"submit_line\",\"text\":\"files.list\"}\n");
    }

    #[rstest]
    #[case(ServerMessage::output("hello\r\n"), "append_output")]
    #[case(ServerMessage::prompt_ready("root@mainframe> "), "prompt_ready")]
    #[case(ServerMessage::show_media("https://example.invalid/v"), "show_media")]
    fn server_messages_are_tagged(#[case] message: ServerMessage, #[case] kind: &str) {
        let mut output = Vec::new();
        write_message(&mut output, &message).expect("write");

        let parsed: ServerMessage = parse_message(&output).expect("parse");
        assert_eq!(parsed, message);
        assert!(String::from_utf8_lossy(&output).contains(&format!("\"kind\":\"{kind}\"")));
    }

    #[test]
    fn rejects_unknown_kind() {
        let error = parse_message::<ClientMessage>(br#"{"kind":"resize","cols":80}"#)
            .expect_err("unknown kind");
        assert!(matches!(error, ProtocolError::Malformed(_)));
    }

    #[test]
    fn reader_skips_blank_lines_and_handles_missing_final_newline() {
        let input = b"\n{\"kind\":\"submit_line\",\"text\":\"a\"}\n{\"kind\":\"submit_line\",\"text\":\"b\"}";
        let mut reader = LineReader::new(Cursor::new(input.to_vec()));

        let first: Option<ClientMessage> = reader.read_message().expect("first");
        let second: Option<ClientMessage> = reader.read_message().expect("second");
        let end: Option<ClientMessage> = reader.read_message().expect("end");

        assert_eq!(first, Some(ClientMessage::submit("a")));
        assert_eq!(second, Some(ClientMessage::submit("b")));
        assert_eq!(end, None);
    }

    #[test]
    fn reader_rejects_oversized_lines() {
        let input = vec![b'x'; 64];
        let mut reader = LineReader::with_limit(Cursor::new(input), 16);

        let error = reader.read_line().expect_err("line too long");
        assert!(matches!(error, ProtocolError::LineTooLong { limit: 16 }));
    }
}
