//! Terminal-independent client state: the line editor plus the media overlay.

use cyberquest_protocol::ServerMessage;

use crate::editor::{KeyPress, LineEditor};

/// Shown once the server closes the connection.
pub(crate) const DISCONNECTED_NOTICE: &str = "\r\ndisconnected...\r\n";

/// Change to the media overlay requested by an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Overlay {
    Show(String),
    Hide,
}

/// Everything the terminal has to do after one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Update {
    /// Text written to the terminal verbatim.
    pub(crate) text: String,
    /// Line to submit to the server.
    pub(crate) submit: Option<String>,
    pub(crate) overlay: Option<Overlay>,
}

#[derive(Debug, Default)]
pub(crate) struct ClientSession {
    editor: LineEditor,
    media: Option<String>,
}

impl ClientSession {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on_server(&mut self, message: ServerMessage) -> Update {
        match message {
            ServerMessage::AppendOutput { text } => Update {
                text,
                ..Update::default()
            },
            ServerMessage::PromptReady { prompt } => {
                self.editor.mark_ready();
                Update {
                    text: prompt,
                    ..Update::default()
                }
            }
            ServerMessage::ShowMedia { link } => {
                self.media = Some(link.clone());
                Update {
                    text: format!("[media] {link} (Esc to close)\r\n"),
                    overlay: Some(Overlay::Show(link)),
                    ..Update::default()
                }
            }
        }
    }

    pub(crate) fn on_key(&mut self, press: KeyPress) -> Update {
        let output = self.editor.handle(press);
        let overlay = (output.dismiss_overlay && self.media.take().is_some()).then_some(Overlay::Hide);
        Update {
            text: output.echo,
            submit: output.committed,
            overlay,
        }
    }

    pub(crate) fn on_disconnect(&mut self) -> Update {
        self.editor.mark_busy();
        Update {
            text: DISCONNECTED_NOTICE.to_owned(),
            overlay: self.media.take().map(|_| Overlay::Hide),
            ..Update::default()
        }
    }
}
