//! Raw-mode terminal front-end.
//!
//! A reader thread decodes server messages into a channel while the main
//! thread polls the keyboard, so output keeps flowing while no key is
//! pressed.

use std::io::Write;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{SetTitle, disable_raw_mode, enable_raw_mode};
use cyberquest_protocol::{ClientMessage, LineReader, ServerMessage, write_message};

use crate::AppError;
use crate::editor::{Key, KeyPress};
use crate::session::{ClientSession, Overlay, Update};
use crate::transport::Connection;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const WINDOW_TITLE: &str = "cyberquest";

enum Inbound {
    Message(ServerMessage),
    Closed,
}

/// Restores cooked mode when dropped.
struct RawMode;

impl RawMode {
    fn enable() -> Result<Self, AppError> {
        enable_raw_mode().map_err(AppError::Terminal)?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        disable_raw_mode().ok();
    }
}

/// What a key event means to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyAction {
    Edit(KeyPress),
    Quit,
}

/// Maps a crossterm key event. Keys the editor has no use for yield `None`.
pub(crate) fn map_key(event: &KeyEvent) -> Option<KeyAction> {
    if event.kind == KeyEventKind::Release {
        return None;
    }
    let control = event.modifiers.contains(KeyModifiers::CONTROL);
    let key = match event.code {
        KeyCode::Char('c' | 'd') if control => return Some(KeyAction::Quit),
        KeyCode::Char(ch) => Key::Char(ch),
        KeyCode::Enter => Key::Enter,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Esc => Key::Escape,
        _ => return None,
    };
    let modifier_held = event.modifiers.intersects(
        KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER | KeyModifiers::META,
    );
    Some(KeyAction::Edit(KeyPress { key, modifier_held }))
}

/// Runs an interactive session until the server disconnects or the user
/// quits.
pub(crate) fn run_session<W: Write>(
    connection: &mut Connection,
    out: &mut W,
) -> Result<(), AppError> {
    let input = connection.try_clone().map_err(AppError::SplitConnection)?;
    let (sender, receiver) = mpsc::channel();
    let reader = thread::spawn(move || forward_messages(input, &sender));

    let result = {
        let _raw = RawMode::enable()?;
        drive(connection, &receiver, out)
    };
    // Wakes the reader if the server is still talking.
    connection.shutdown().ok();
    if reader.join().is_err() {
        writeln!(out, "server reader stopped unexpectedly").map_err(AppError::Terminal)?;
    }
    result
}

fn drive<W: Write>(
    connection: &mut Connection,
    inbound: &Receiver<Inbound>,
    out: &mut W,
) -> Result<(), AppError> {
    let mut session = ClientSession::new();
    loop {
        loop {
            match inbound.try_recv() {
                Ok(Inbound::Message(message)) => render(out, &session.on_server(message))?,
                Ok(Inbound::Closed) | Err(TryRecvError::Disconnected) => {
                    render(out, &session.on_disconnect())?;
                    return Ok(());
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        if !event::poll(POLL_INTERVAL).map_err(AppError::Terminal)? {
            continue;
        }
        let Event::Key(key) = event::read().map_err(AppError::Terminal)? else {
            continue;
        };
        match map_key(&key) {
            Some(KeyAction::Quit) => {
                out.write_all(b"\r\n").map_err(AppError::Terminal)?;
                return Ok(());
            }
            Some(KeyAction::Edit(press)) => {
                let update = session.on_key(press);
                render(out, &update)?;
                if let Some(line) = update.submit {
                    write_message(connection, &ClientMessage::submit(line))
                        .map_err(AppError::SendLine)?;
                }
            }
            None => {}
        }
    }
}

fn render<W: Write>(out: &mut W, update: &Update) -> Result<(), AppError> {
    out.write_all(update.text.as_bytes())
        .map_err(AppError::Terminal)?;
    match &update.overlay {
        Some(Overlay::Show(link)) => {
            execute!(out, SetTitle(format!("{WINDOW_TITLE} | {link}")))
                .map_err(AppError::Terminal)?;
        }
        Some(Overlay::Hide) => execute!(out, SetTitle(WINDOW_TITLE)).map_err(AppError::Terminal)?,
        None => {}
    }
    out.flush().map_err(AppError::Terminal)
}

fn forward_messages(stream: Connection, messages: &Sender<Inbound>) {
    let mut reader = LineReader::new(stream);
    loop {
        let inbound = match reader.read_message::<ServerMessage>() {
            Ok(Some(message)) => Inbound::Message(message),
            Ok(None) | Err(_) => Inbound::Closed,
        };
        let closed = matches!(inbound, Inbound::Closed);
        if messages.send(inbound).is_err() || closed {
            return;
        }
    }
}
