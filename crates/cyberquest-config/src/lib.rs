//! Shared configuration for the CyberQuest session server and terminal client.
//!
//! Both binaries resolve the same [`Config`] so the client dials the endpoint
//! the server listens on. Values are layered, lowest precedence first:
//!
//! 1. built-in defaults (see [`defaults`]),
//! 2. a TOML file named by `--config-path` / `CYBERQUEST_CONFIG_PATH`, or
//!    `cyberquest.toml` in the working directory when present,
//! 3. `CYBERQUEST_*` environment variables,
//! 4. command-line flags.

mod defaults;
mod logging;
mod pacing;
mod socket;

use std::ffi::OsString;
use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::{
    DEFAULT_CONFIG_FILE, DEFAULT_LOG_FILTER, DEFAULT_TCP_PORT, DEFAULT_WORLD_PATH,
    default_log_filter, default_log_format, default_socket_endpoint, default_world_path,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use pacing::Pacing;
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    /// Endpoint the server binds and the client connects to.
    pub listen: SocketEndpoint,
    /// YAML file holding hosts, files, mails and users.
    pub world_path: Utf8PathBuf,
    /// `tracing` filter expression.
    pub log_filter: String,
    /// Log line format.
    pub log_format: LogFormat,
    /// Whether scripted output delays are honoured.
    pub pacing: Pacing,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_socket_endpoint(),
            world_path: default_world_path(),
            log_filter: default_log_filter().to_owned(),
            log_format: default_log_format(),
            pacing: Pacing::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// See [`Config::load_from_iter`].
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_iter(std::env::args_os())
    }

    /// Loads configuration from an explicit argument list.
    ///
    /// The first item is treated as the binary name, as with `std::env::args_os`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Cli`] for unknown flags or invalid values (this
    /// includes `--help`), and [`ConfigError::ReadFile`] /
    /// [`ConfigError::ParseFile`] when the configuration file cannot be used.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = ConfigArgs::try_parse_from(args)?;
        let file = match cli.config_path.as_deref() {
            Some(path) => ConfigLayer::read(path)?,
            None => {
                let fallback = Utf8Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    ConfigLayer::read(fallback)?
                } else {
                    ConfigLayer::default()
                }
            }
        };
        Ok(file.overlay(cli.layer).resolve())
    }

    /// Endpoint the server binds and the client connects to.
    #[must_use]
    pub fn listen(&self) -> &SocketEndpoint {
        &self.listen
    }

    /// Location of the world content file.
    #[must_use]
    pub fn world_path(&self) -> &Utf8Path {
        &self.world_path
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log line format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Output pacing mode.
    #[must_use]
    pub fn pacing(&self) -> Pacing {
        self.pacing
    }
}

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Command-line parsing failed, or help/version output was requested.
    #[error("{0}")]
    Cli(#[from] clap::Error),
    /// The configuration file could not be read.
    #[error("failed to read configuration file '{path}': {source}")]
    ReadFile {
        /// File that was named or discovered.
        path: Utf8PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: io::Error,
    },
    /// The configuration file is not valid TOML or has unknown keys.
    #[error("failed to parse configuration file '{path}': {source}")]
    ParseFile {
        /// File that failed to parse.
        path: Utf8PathBuf,
        /// TOML decoding error.
        #[source]
        source: Box<toml::de::Error>,
    },
}

impl ConfigError {
    /// Returns the clap error when the failure came from argument parsing.
    ///
    /// Binaries use this to let clap print help and version output itself.
    #[must_use]
    pub fn as_cli(&self) -> Option<&clap::Error> {
        match self {
            Self::Cli(error) => Some(error),
            Self::ReadFile { .. } | Self::ParseFile { .. } => None,
        }
    }
}

#[derive(Debug, Parser)]
#[command(disable_help_subcommand = true)]
struct ConfigArgs {
    /// Path to a TOML configuration file.
    #[arg(long, env = "CYBERQUEST_CONFIG_PATH", value_name = "PATH")]
    config_path: Option<Utf8PathBuf>,
    #[command(flatten)]
    layer: ConfigLayer,
}

/// One source of overrides. Unset fields defer to lower layers.
///
/// The same shape is read from the TOML file and from flags, so both layers
/// share one merge.
#[derive(Debug, Default, Clone, PartialEq, Eq, Args, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigLayer {
    /// Endpoint such as `tcp://127.0.0.1:4210` or `unix:///run/cyberquest.sock`.
    #[arg(long, env = "CYBERQUEST_LISTEN", value_name = "ENDPOINT")]
    listen: Option<SocketEndpoint>,
    /// YAML world content file.
    #[arg(long, env = "CYBERQUEST_WORLD_PATH", value_name = "PATH")]
    world_path: Option<Utf8PathBuf>,
    /// Log filter expression, for example `info,cyberquestd::dispatch=debug`.
    #[arg(long, env = "CYBERQUEST_LOG_FILTER", value_name = "FILTER")]
    log_filter: Option<String>,
    /// Log output format (`json` or `compact`).
    #[arg(long, env = "CYBERQUEST_LOG_FORMAT", value_name = "FORMAT")]
    log_format: Option<LogFormat>,
    /// Output pacing (`realtime` or `instant`).
    #[arg(long, env = "CYBERQUEST_PACING", value_name = "MODE")]
    pacing: Option<Pacing>,
}

impl ConfigLayer {
    fn read(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source: Box::new(source),
        })
    }

    /// Stacks `higher` on top of this layer.
    fn overlay(self, higher: Self) -> Self {
        Self {
            listen: higher.listen.or(self.listen),
            world_path: higher.world_path.or(self.world_path),
            log_filter: higher.log_filter.or(self.log_filter),
            log_format: higher.log_format.or(self.log_format),
            pacing: higher.pacing.or(self.pacing),
        }
    }

    /// Fills whatever no layer set from the built-in defaults.
    fn resolve(self) -> Config {
        let defaults = Config::default();
        Config {
            listen: self.listen.unwrap_or(defaults.listen),
            world_path: self.world_path.unwrap_or(defaults.world_path),
            log_filter: self.log_filter.unwrap_or(defaults.log_filter),
            log_format: self.log_format.unwrap_or(defaults.log_format),
            pacing: self.pacing.unwrap_or(defaults.pacing),
        }
    }
}
