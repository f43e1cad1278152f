//! Log output formats.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Shape of the server's log lines on stderr.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, fields flattened.
    #[default]
    Json,
    /// Terse text for watching a server in a terminal.
    Compact,
}

impl LogFormat {
    /// Whether log lines are meant for a machine rather than a person.
    #[must_use]
    pub fn is_structured(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Rejected `--log-format` value.
pub type LogFormatParseError = strum::ParseError;
