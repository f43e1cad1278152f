//! Log output for the session server.
//!
//! Everything goes to stderr through one global `tracing` subscriber. The
//! terminal client never installs one since it owns the terminal.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, time::UtcTime};

use cyberquest_config::Config;

static INSTALLED: OnceCell<()> = OnceCell::new();

/// Proof that logging is set up for this process.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle;

/// Why logging could not be set up.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configured filter expression does not parse.
    #[error("invalid log filter '{filter}': {reason}")]
    Filter {
        /// Expression as configured.
        filter: String,
        /// Parser diagnostic.
        reason: String,
    },
    /// Another global subscriber was installed first.
    #[error("failed to install log subscriber: {0}")]
    Install(#[from] SetGlobalDefaultError),
}

/// Installs the subscriber the first time it is called.
///
/// Later calls succeed without reconfiguring anything, so several servers may
/// bootstrap in one test process.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter does not parse or another
/// subscriber already owns the process.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED.get_or_try_init(|| install(config))?;
    Ok(TelemetryHandle)
}

fn install(config: &Config) -> Result<(), TelemetryError> {
    let filter = parse_filter(config.log_filter())?;
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339())
        .with_target(true)
        // Session threads are named per connection.
        .with_thread_names(true);

    if config.log_format().is_structured() {
        tracing::subscriber::set_global_default(builder.json().flatten_event(true).finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.compact().finish())?;
    }
    Ok(())
}

fn parse_filter(directives: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directives).map_err(|error| TelemetryError::Filter {
        filter: directives.to_owned(),
        reason: error.to_string(),
    })
}
