//! `files.list` and `files.open`.

use serde::Deserialize;
use tracing::debug;

use super::COMMANDS_TARGET;
use crate::dispatch::{CommandContext, CommandError};
use crate::playback;

/// Arguments of `files.open`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesOpenArguments {
    /// Name of the file on the current host.
    pub file: Option<String>,
    /// Password, for protected files.
    pub password: Option<String>,
}

/// `files.list`: every file on the current host, `E` marking protected ones.
pub(super) fn list(context: &mut CommandContext<'_>) -> Result<(), CommandError> {
    let Some(host) = context.current_host() else {
        return Ok(());
    };
    for file in &host.files {
        if file.is_protected() {
            context.write_line(&format!("E {}", file.name))?;
        } else {
            context.write_line(&format!("  {}", file.name))?;
        }
        context.pause(200);
    }
    Ok(())
}

/// `files.open`: checks the password and shows the file's payload.
pub(super) fn open(
    context: &mut CommandContext<'_>,
    arguments: Option<FilesOpenArguments>,
) -> Result<(), CommandError> {
    let arguments = arguments.unwrap_or_default();
    let Some(name) = arguments.file.filter(|name| !name.trim().is_empty()) else {
        return context.write_line("Usage: files.open { file: \"fileName\"}...");
    };

    let Some(file) = context.current_host().and_then(|host| host.file(&name)) else {
        return context.write_line(&format!("File {name} not found!"));
    };

    if file.is_protected() {
        let Some(password) = arguments
            .password
            .filter(|password| !password.trim().is_empty())
        else {
            context.write_line("Missing parameter \"password\"")?;
            return context
                .write_line("Usage: files.open { file: \"fileName\", password:\"password\"}...");
        };
        if !file.passwords.contains(&password) {
            return context.write_line("Invalid password!");
        }
    }

    if let Some(text) = non_blank(file.text.as_deref()) {
        return context.write_line(text);
    }
    if let Some(link) = non_blank(file.media_link.as_deref()) {
        return context.show_media(link);
    }
    if let Some(script_ref) = non_blank(file.script_ref.as_deref()) {
        if let Some(steps) = context.world().script(script_ref) {
            return playback::play(context, steps);
        }
        debug!(target: COMMANDS_TARGET, file = %name, script = script_ref, "script not loaded");
    }

    context.write_line(&format!("File {name} is empty."))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}
