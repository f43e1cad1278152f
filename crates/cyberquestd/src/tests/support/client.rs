//! Minimal protocol client driving a session over a real socket.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use cyberquest_protocol::{ClientMessage, LineReader, ProtocolError, ServerMessage, write_message};

const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Output gathered up to and including a prompt.
#[derive(Debug, Default)]
pub struct Exchange {
    pub output: String,
    pub media: Vec<String>,
    pub prompt: String,
}

pub struct TestClient {
    reader: LineReader<Box<dyn Read + Send>>,
    writer: Box<dyn Write + Send>,
}

impl TestClient {
    pub fn tcp(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).expect("connect to session listener");
        stream
            .set_read_timeout(Some(READ_TIMEOUT))
            .expect("set read timeout");
        let reader = stream.try_clone().expect("clone tcp stream");
        Self {
            reader: LineReader::new(Box::new(reader)),
            writer: Box::new(stream),
        }
    }

    #[cfg(unix)]
    pub fn unix(path: &camino::Utf8Path) -> Self {
        let stream = std::os::unix::net::UnixStream::connect(path.as_std_path())
            .expect("connect to unix session listener");
        stream
            .set_read_timeout(Some(READ_TIMEOUT))
            .expect("set read timeout");
        let reader = stream.try_clone().expect("clone unix stream");
        Self {
            reader: LineReader::new(Box::new(reader)),
            writer: Box::new(stream),
        }
    }

    pub fn submit(&mut self, line: &str) {
        write_message(&mut self.writer, &ClientMessage::submit(line)).expect("submit line");
    }

    /// Writes raw bytes, bypassing message framing.
    pub fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).expect("write raw bytes");
        self.writer.flush().expect("flush raw bytes");
    }

    /// Next server message, or `None` once the server closes the connection.
    pub fn next_message(&mut self) -> Option<ServerMessage> {
        match self.reader.read_message::<ServerMessage>() {
            Ok(message) => message,
            Err(ProtocolError::Io(error))
                if matches!(
                    error.kind(),
                    io::ErrorKind::ConnectionReset | io::ErrorKind::BrokenPipe
                ) =>
            {
                None
            }
            Err(error) => panic!("failed to read server message: {error}"),
        }
    }

    /// Collects output until the next prompt.
    pub fn until_prompt(&mut self) -> Exchange {
        let mut exchange = Exchange::default();
        loop {
            match self.next_message().expect("connection closed before prompt") {
                ServerMessage::AppendOutput { text } => exchange.output.push_str(&text),
                ServerMessage::ShowMedia { link } => exchange.media.push(link),
                ServerMessage::PromptReady { prompt } => {
                    exchange.prompt = prompt;
                    return exchange;
                }
            }
        }
    }

    /// Submits `line` and collects the reply up to the next prompt.
    pub fn run(&mut self, line: &str) -> Exchange {
        self.submit(line);
        self.until_prompt()
    }
}
