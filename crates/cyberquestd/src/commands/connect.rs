//! `connect`: moving the session between hosts.

use serde::Deserialize;
use tracing::info;

use super::COMMANDS_TARGET;
use crate::dispatch::{CommandContext, CommandError};

/// Arguments of `connect`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectArguments {
    /// Host to move to.
    pub host: Option<String>,
    /// Account name, required by hosts that have users.
    pub user: Option<String>,
    /// Password, required by accounts that have one.
    pub password: Option<String>,
}

/// `connect`: moves the session to another host, logging in when the host
/// has accounts.
pub(super) fn connect(
    context: &mut CommandContext<'_>,
    arguments: Option<ConnectArguments>,
) -> Result<(), CommandError> {
    let arguments = arguments.unwrap_or_default();
    let Some(host_id) = arguments.host else {
        return context.write_line("Usage: connect { host: \"hostname\"}...");
    };
    let Some(host) = context.world().host(&host_id) else {
        return context.write_line(&format!("Unknown host {host_id}"));
    };

    context.write(&format!("Establishing connection to {host_id}..."))?;
    context.pause(500);

    let user = if host.requires_login() {
        let Some(user_name) = arguments.user.filter(|user| !user.trim().is_empty()) else {
            context.write_line("")?;
            context.write_line("Missing parameter \"user\"")?;
            return context
                .write_line("Usage: connect { host: \"hostname\", user: \"username\"}...");
        };
        let Some(account) = host.user(&user_name) else {
            context.write_line("")?;
            return context.write_line(&format!("Unknown user {user_name}"));
        };
        if let Some(expected) = account.required_password() {
            let Some(password) = arguments
                .password
                .filter(|password| !password.trim().is_empty())
            else {
                context.write_line("")?;
                context.write_line("Missing parameter \"password\"")?;
                return context.write_line(
                    "Usage: connect { host: \"hostname\", user: \"username\", password: \"password\"}...",
                );
            };
            if password != expected {
                context.write_line("")?;
                return context.write_line("Invalid password");
            }
        }
        Some(account.user_name.clone())
    } else {
        None
    };

    info!(
        target: COMMANDS_TARGET,
        host = %host_id,
        user = user.as_deref().unwrap_or("-"),
        "session connected to host"
    );
    context.session_mut().connect_to(host_id, user);
    context.write_line(" connected!")
}
