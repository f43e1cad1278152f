//! `mails.list` and `mails.open`.

use serde::Deserialize;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use tracing::warn;

use super::{COMMANDS_TARGET, trimmed_lines};
use crate::dispatch::{CommandContext, CommandError};

/// `2021-Mar-05 Fri`, the listing's date column.
const LIST_DATE: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month repr:short]-[day] [weekday repr:short]");

const HEADER_DATE: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Arguments of `mails.open`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailsOpenArguments {
    /// Zero-based position in the host's mail list.
    pub id: Option<i64>,
}

/// `mails.list`: one row per mail on the current host.
pub(super) fn list(context: &mut CommandContext<'_>) -> Result<(), CommandError> {
    context.write_line(&format!(
        "ID\t\t{:<15}\t\t\t{:<50}\t\tSubject",
        "Date", "From"
    ))?;
    let Some(host) = context.current_host() else {
        return Ok(());
    };
    for (id, mail) in host.mails.iter().enumerate() {
        context.write_line(&format!(
            "[{id}]\t{}\t\t\t{:<50}\t\t{}",
            format_date(mail.timestamp, LIST_DATE),
            mail.from,
            mail.subject
        ))?;
        context.pause(200);
    }
    Ok(())
}

/// `mails.open`: headers, then the body line by line.
pub(super) fn open(
    context: &mut CommandContext<'_>,
    arguments: Option<MailsOpenArguments>,
) -> Result<(), CommandError> {
    let Some(id) = arguments.and_then(|arguments| arguments.id) else {
        return context.write_line("Usage: mails.open { id: 0}...");
    };

    let mail = usize::try_from(id).ok().and_then(|index| {
        context
            .current_host()
            .and_then(|host| host.mails.get(index))
    });
    let Some(mail) = mail else {
        return context.write_line(&format!("Invalid ID {id}"));
    };

    let headers = [
        format!("Date: {}", format_date(mail.timestamp, HEADER_DATE)),
        format!("From: {}", mail.from),
        format!("To: {}", mail.to),
        format!("Subject: {}", mail.subject),
        String::new(),
    ];
    for header in &headers {
        context.write_line(header)?;
        context.pause(100);
    }

    for line in trimmed_lines(&mail.text) {
        context.write_line(&line)?;
        context.pause(100);
    }
    context.write_line("")
}

fn format_date(timestamp: OffsetDateTime, format: &[BorrowedFormatItem<'_>]) -> String {
    timestamp.format(format).unwrap_or_else(|error| {
        warn!(target: COMMANDS_TARGET, %error, "mail timestamp could not be formatted");
        timestamp.to_string()
    })
}
