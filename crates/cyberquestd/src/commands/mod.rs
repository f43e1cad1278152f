//! The built-in terminal commands.
//!
//! Each submodule owns one command family and its argument shape. Argument
//! fields are all optional so that a partially filled object still binds and
//! the handler can answer with its own usage text.

mod connect;
mod files;
mod help;
mod mails;
mod user;


use crate::dispatch::CommandRegistry;

const COMMANDS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::commands");

pub use self::connect::ConnectArguments;
pub use self::files::FilesOpenArguments;
pub use self::mails::MailsOpenArguments;
pub use self::user::CreateUserArguments;

/// Builds the registry holding every built-in command.
#[must_use]
pub fn registry() -> CommandRegistry {
    CommandRegistry::builder()
        .command("help", help::print_help)
        .command("files.list", files::list)
        .command_with_args("files.open", files::open)
        .command("mails.list", mails::list)
        .command_with_args("mails.open", mails::open)
        .command_with_args("connect", connect::connect)
        .command_with_args("user.create", user::create)
        .build()
}

/// Splits on `\r\n`, `\r` or `\n` and trims each line.
fn trimmed_lines(text: &str) -> Vec<String> {
    text.split("\r\n")
        .flat_map(|chunk| chunk.split(['\r', '\n']))
        .map(|line| line.trim().to_owned())
        .collect()
}
