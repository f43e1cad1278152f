//! Argument validation with caret diagnostics.
//!
//! An argument-taking command receives everything after the first space of
//! the input line. Before any binding happens the text must be a well-formed
//! object; otherwise the player sees a three-line diagnostic:
//!
//! ```text
//! Expected opening {
//! connect abc
//!         ^
//! ```

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use super::relaxed_json::{self, SyntaxError};

/// A syntax problem in a command's argument text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ArgumentSyntaxError {
    message: String,
    line: String,
    offset: usize,
}

impl ArgumentSyntaxError {
    fn new(message: impl Into<String>, command: &str, rest: &str, offset: usize) -> Self {
        Self {
            message: message.into(),
            line: format!("{command} {rest}"),
            offset,
        }
    }

    /// First diagnostic line, without the echoed input or caret.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Character offset into `"<command> <argument>"` that the caret marks.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The three diagnostic lines: message, echoed input, caret.
    #[must_use]
    pub fn diagnostic_lines(&self) -> [String; 3] {
        [
            self.message.clone(),
            self.line.clone(),
            format!("{}^", " ".repeat(self.offset)),
        ]
    }

    /// Formats the diagnostic as three lines.
    #[must_use]
    pub fn render(&self) -> Diagnostic<'_> {
        Diagnostic(self)
    }
}

/// Display adapter produced by [`ArgumentSyntaxError::render`].
pub struct Diagnostic<'a>(&'a ArgumentSyntaxError);

impl fmt::Display for Diagnostic<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [message, line, caret] = self.0.diagnostic_lines();
        write!(formatter, "{message}\n{line}\n{caret}")
    }
}

/// Validates `rest` as the argument object of `command`.
///
/// Offsets count characters, so the caret lines up under the echoed input.
/// The echoed line is `"<command> <rest>"` with `rest` untrimmed, so a
/// structural error inside the object is placed at
/// `len(command) + 1 + leading whitespace of rest + column`, where `column`
/// counts from the opening `{`.
///
/// # Errors
///
/// Returns [`ArgumentSyntaxError`] when `rest` is not a single well-formed
/// object.
pub fn parse_arguments(command: &str, rest: &str) -> Result<Value, ArgumentSyntaxError> {
    let command_len = command.chars().count();
    let trimmed = rest.trim();

    if !trimmed.starts_with('{') {
        return Err(ArgumentSyntaxError::new(
            "Expected opening {",
            command,
            rest,
            command_len + 1,
        ));
    }
    if !trimmed.ends_with('}') {
        return Err(ArgumentSyntaxError::new(
            "Expected matching }",
            command,
            rest,
            command_len + rest.chars().count() + 1,
        ));
    }

    let leading = rest.chars().take_while(|ch| ch.is_whitespace()).count();
    relaxed_json::parse(trimmed).map_err(|SyntaxError { kind, column }| {
        ArgumentSyntaxError::new(kind.message(), command, rest, command_len + leading + column + 1)
    })
}
