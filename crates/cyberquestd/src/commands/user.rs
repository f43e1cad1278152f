//! `user.create`.

use serde::Deserialize;

use crate::dispatch::{CommandContext, CommandError};

/// Arguments of `user.create`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserArguments {
    /// Requested account name.
    pub name: Option<String>,
}

/// `user.create`: acknowledges the request. Accounts are not persisted.
pub(super) fn create(
    context: &mut CommandContext<'_>,
    arguments: Option<CreateUserArguments>,
) -> Result<(), CommandError> {
    match arguments.and_then(|arguments| arguments.name) {
        Some(name) => context.write_line(&format!("Creating User {name}...")),
        None => context.write_line("Usage: user.create { name: \"userName\"}..."),
    }
}
