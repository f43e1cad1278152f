//! Command dispatch for submitted input lines.
//!
//! A line is split on its first space into a command name and an optional
//! argument text. The name is looked up in the [`CommandRegistry`]; argument
//! commands have their text validated by [`parse_arguments`] before the
//! registry binds it to the command's typed shape.
//!
//! Only two failure kinds are treated as faults: argument binding errors and
//! handler faults, panics included. Both are logged with full detail and
//! shown to the player as a single generic line. Syntax errors are shown in full since they help
//! the player fix their input.

mod arguments;
mod context;
mod errors;
mod registry;
mod relaxed_json;

pub use self::arguments::{ArgumentSyntaxError, Diagnostic, parse_arguments};
pub use self::context::{CommandContext, LINE_BREAK};
pub use self::errors::CommandError;
pub use self::registry::{CommandDescriptor, CommandRegistry, CommandRegistryBuilder};

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, warn};

use crate::session::SinkError;

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// How a dispatched line ended. Every outcome is followed by a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The handler ran to completion.
    Completed,
    /// No command with that name is registered.
    NotFound,
    /// The argument text was malformed; a caret diagnostic was shown.
    SyntaxError,
    /// The arguments did not fit the command's shape.
    BindingFailed,
    /// The handler reported an internal fault or panicked.
    HandlerFault,
    /// The line was blank.
    Empty,
}

/// Splits a line into command name and optional argument text.
///
/// Only the first space separates; the argument keeps any further spaces.
#[must_use]
pub fn tokenise(line: &str) -> (&str, Option<&str>) {
    let line = line.trim_start();
    match line.split_once(' ') {
        Some((name, rest)) => (name, Some(rest)),
        None => (line.trim_end(), None),
    }
}

/// Runs one input line against `registry`.
///
/// # Errors
///
/// Returns [`SinkError`] when output can no longer reach the client. Every
/// other failure is reported to the player and yields a [`DispatchOutcome`].
pub fn dispatch_line(
    registry: &CommandRegistry,
    context: &mut CommandContext<'_>,
    line: &str,
) -> Result<DispatchOutcome, SinkError> {
    let (name, rest) = tokenise(line);
    if name.is_empty() {
        return Ok(DispatchOutcome::Empty);
    }

    let Some(command) = registry.get(name) else {
        debug!(target: DISPATCH_TARGET, command = name, "unknown command");
        emit_line(context, &format!("Command {name} not found!"))?;
        return Ok(DispatchOutcome::NotFound);
    };

    let rest = rest.filter(|text| !text.trim().is_empty());
    let arguments = match (command.takes_arguments(), rest) {
        (true, Some(text)) => match parse_arguments(name, text) {
            Ok(value) => Some(value),
            Err(syntax) => {
                debug!(
                    target: DISPATCH_TARGET,
                    command = name,
                    offset = syntax.offset(),
                    error = %syntax,
                    "argument syntax error"
                );
                for line in syntax.diagnostic_lines() {
                    emit_line(context, &line)?;
                }
                return Ok(DispatchOutcome::SyntaxError);
            }
        },
        (false, Some(text)) => {
            debug!(
                target: DISPATCH_TARGET,
                command = name,
                ignored = text,
                "argument ignored for command without arguments"
            );
            None
        }
        (_, None) => None,
    };

    let invoked = panic::catch_unwind(AssertUnwindSafe(|| command.invoke(context, arguments)))
        .unwrap_or_else(|payload| Err(CommandError::fault(panic_message(payload.as_ref()))));
    match invoked {
        Ok(()) => Ok(DispatchOutcome::Completed),
        Err(CommandError::Output(source)) => Err(source),
        Err(binding @ CommandError::Binding { .. }) => {
            warn!(target: DISPATCH_TARGET, command = name, error = %binding, "argument binding failed");
            emit_line(context, &format!("Error executing command {name}"))?;
            Ok(DispatchOutcome::BindingFailed)
        }
        Err(fault @ CommandError::Fault { .. }) => {
            error!(target: DISPATCH_TARGET, command = name, error = %fault, "command handler fault");
            emit_line(context, &format!("Error executing command {name}"))?;
            Ok(DispatchOutcome::HandlerFault)
        }
    }
}

/// Recovers the text a handler panicked with.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("no message");
    format!("handler panicked: {detail}")
}

/// Writes one line outside any handler, keeping only the sink failure.
pub(crate) fn emit_line(context: &mut CommandContext<'_>, text: &str) -> Result<(), SinkError> {
    match context.write_line(text) {
        Ok(()) => Ok(()),
        Err(CommandError::Output(source)) => Err(source),
        Err(other) => {
            error!(target: DISPATCH_TARGET, error = %other, "unexpected output failure");
            Err(SinkError::Closed)
        }
    }
}

#[cfg(test)]
mod tests;
