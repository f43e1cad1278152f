//! `help`.

use super::trimmed_lines;
use crate::dispatch::{CommandContext, CommandError};

/// `help`: the world's help text, or the list of registered commands.
pub(super) fn print_help(context: &mut CommandContext<'_>) -> Result<(), CommandError> {
    if let Some(text) = context.world().help_text() {
        for line in trimmed_lines(text) {
            context.write_line(&line)?;
            context.pause(100);
        }
        return Ok(());
    }

    context.write_line("known commands:")?;
    for name in context.command_names() {
        context.write_line(name)?;
    }
    Ok(())
}
