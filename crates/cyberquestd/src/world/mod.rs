//! Read-only world content: hosts, their users, files and mail.
//!
//! The world is loaded once at startup (see [`World::load`]) and shared
//! between sessions behind an `Arc`. Nothing mutates it afterwards.

mod load;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Deserialize;
use time::OffsetDateTime;

pub use self::load::WorldError;

pub(crate) const WORLD_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::world");

/// Host used when the content does not name a default.
pub const FALLBACK_HOST: &str = "localhost";

/// A virtual machine in the simulated world.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostRecord {
    /// Accounts accepted by `connect`. An empty list means anonymous access.
    pub users: Vec<UserRecord>,
    /// Files listed by `files.list`, in content order.
    pub files: Vec<FileRecord>,
    /// Mail listed by `mails.list`, in content order.
    pub mails: Vec<MailRecord>,
}

impl HostRecord {
    /// Finds a file by exact name.
    #[must_use]
    pub fn file(&self, name: &str) -> Option<&FileRecord> {
        self.files.iter().find(|file| file.name == name)
    }

    /// Finds a user account by exact name.
    #[must_use]
    pub fn user(&self, name: &str) -> Option<&UserRecord> {
        self.users.iter().find(|user| user.user_name == name)
    }

    /// Whether `connect` must name one of [`HostRecord::users`].
    #[must_use]
    pub fn requires_login(&self) -> bool {
        !self.users.is_empty()
    }
}

/// An account on a host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Name given to `connect` as `user`.
    pub user_name: String,
    /// Password checked by `connect`. Blank means none.
    #[serde(default)]
    pub password: Option<String>,
}

impl UserRecord {
    /// Returns the password when one is set and not blank.
    #[must_use]
    pub fn required_password(&self) -> Option<&str> {
        self.password
            .as_deref()
            .filter(|password| !password.trim().is_empty())
    }
}

/// A file on a host. At most one of the payload fields is shown when opened,
/// checked in the order text, media link, script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Name given to `files.open`.
    pub name: String,
    /// Plain text printed on open.
    #[serde(default)]
    pub text: Option<String>,
    /// Link the client is asked to present.
    #[serde(default, alias = "youTube")]
    pub media_link: Option<String>,
    /// Any of these unlocks the file. Empty means unprotected.
    #[serde(default)]
    pub passwords: BTreeSet<String>,
    /// Name of a sequence script, resolved relative to the world file.
    #[serde(default, alias = "sequence")]
    pub script_ref: Option<String>,
}

impl FileRecord {
    /// Whether opening the file needs a password.
    #[must_use]
    pub fn is_protected(&self) -> bool {
        !self.passwords.is_empty()
    }
}

/// A message in a host's mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailRecord {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// RFC 3339 send time.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Body, trimmed line by line when shown.
    #[serde(default)]
    pub text: String,
}

/// One step of a scripted narrative played back by `files.open`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceStep {
    /// Speaker shown at the start of a line. Carries over to later steps.
    #[serde(default)]
    pub speaker: Option<String>,
    /// Text revealed by the step.
    #[serde(default)]
    pub text: String,
    /// Hex colour. Parsed for content compatibility; output is uncoloured.
    #[serde(default = "default_step_color")]
    pub color: String,
    /// Pause after the step.
    #[serde(default = "default_step_delay", alias = "delay")]
    pub delay_ms: u64,
    /// Reveal speed for the step's text.
    #[serde(default = "default_chars_per_second", alias = "speed")]
    pub chars_per_second: u32,
    /// Whether the step ends its line.
    #[serde(default = "default_line_break")]
    pub line_break: bool,
    /// Hex colour of the speaker prefix. Parsed, not rendered.
    #[serde(default)]
    pub speaker_color: Option<String>,
}

impl SequenceStep {
    /// Builds a step with default pacing.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            speaker: None,
            text: text.into(),
            color: default_step_color(),
            delay_ms: default_step_delay(),
            chars_per_second: default_chars_per_second(),
            line_break: default_line_break(),
            speaker_color: None,
        }
    }
}

fn default_step_color() -> String {
    "FFFFFF".to_owned()
}

fn default_step_delay() -> u64 {
    1000
}

fn default_chars_per_second() -> u32 {
    20
}

fn default_line_break() -> bool {
    true
}

/// Immutable world content shared by every session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct World {
    default_host: Option<String>,
    default_user: Option<String>,
    banner: Option<String>,
    startup_text: Option<String>,
    help_text: Option<String>,
    hosts: BTreeMap<String, HostRecord>,
    scripts: HashMap<String, Vec<SequenceStep>>,
}

impl World {
    /// Starts an empty world whose sessions begin on `default_host`.
    #[must_use]
    pub fn new(default_host: impl Into<String>) -> Self {
        Self {
            default_host: Some(default_host.into()),
            ..Self::default()
        }
    }

    /// Sets the account new sessions are logged in as.
    #[must_use]
    pub fn with_default_user(mut self, user: impl Into<String>) -> Self {
        self.default_user = Some(user.into());
        self
    }

    /// Sets the first greeting line.
    #[must_use]
    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = Some(banner.into());
        self
    }

    /// Sets the text shown after the banner.
    #[must_use]
    pub fn with_startup_text(mut self, text: impl Into<String>) -> Self {
        self.startup_text = Some(text.into());
        self
    }

    /// Sets the text printed by `help`.
    #[must_use]
    pub fn with_help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = Some(text.into());
        self
    }

    /// Adds or replaces a host.
    #[must_use]
    pub fn with_host(mut self, id: impl Into<String>, host: HostRecord) -> Self {
        self.hosts.insert(id.into(), host);
        self
    }

    /// Adds a loaded sequence script under `name`.
    #[must_use]
    pub fn with_script(mut self, name: impl Into<String>, steps: Vec<SequenceStep>) -> Self {
        self.scripts.insert(name.into(), steps);
        self
    }

    /// Host a new session starts on, falling back to [`FALLBACK_HOST`].
    #[must_use]
    pub fn default_host(&self) -> &str {
        self.default_host.as_deref().unwrap_or(FALLBACK_HOST)
    }

    /// Account new sessions start logged in as.
    #[must_use]
    pub fn default_user(&self) -> Option<&str> {
        self.default_user.as_deref()
    }

    /// First greeting line.
    #[must_use]
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// Greeting text after the banner.
    #[must_use]
    pub fn startup_text(&self) -> Option<&str> {
        self.startup_text.as_deref()
    }

    /// Help text shown by `help`, when the content provides one.
    #[must_use]
    pub fn help_text(&self) -> Option<&str> {
        self.help_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }

    /// Looks up a host by identifier.
    #[must_use]
    pub fn host(&self, id: &str) -> Option<&HostRecord> {
        self.hosts.get(id)
    }

    /// Identifiers of every known host, sorted.
    pub fn host_ids(&self) -> impl Iterator<Item = &str> {
        self.hosts.keys().map(String::as_str)
    }

    /// Steps of a loaded sequence script.
    #[must_use]
    pub fn script(&self, name: &str) -> Option<&[SequenceStep]> {
        self.scripts.get(name).map(Vec::as_slice)
    }

    /// Number of loaded sequence scripts.
    #[must_use]
    pub fn script_count(&self) -> usize {
        self.scripts.len()
    }
}
