//! Error types crossing the command dispatch boundary.

use thiserror::Error;

use crate::session::SinkError;

/// Failures a command invocation can report to the dispatcher.
///
/// Usage problems are not errors: handlers print usage text as ordinary
/// output and return `Ok(())`.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Output could not be delivered. The session ends.
    #[error(transparent)]
    Output(#[from] SinkError),

    /// Arguments were valid syntax but did not fit the command's shape.
    #[error("arguments for '{command}' do not match {shape}: {source}")]
    Binding {
        /// Command whose arguments were rejected.
        command: String,
        /// Type name of the expected argument shape.
        shape: &'static str,
        /// Deserialisation error.
        #[source]
        source: serde_json::Error,
    },

    /// The handler hit an internal fault.
    #[error("{message}")]
    Fault {
        /// What went wrong, for the log only.
        message: String,
    },
}

impl CommandError {
    /// Creates a binding error for `command`.
    pub fn binding(
        command: impl Into<String>,
        shape: &'static str,
        source: serde_json::Error,
    ) -> Self {
        Self::Binding {
            command: command.into(),
            shape,
            source,
        }
    }

    /// Creates a handler fault.
    pub fn fault(message: impl Into<String>) -> Self {
        Self::Fault {
            message: message.into(),
        }
    }
}
