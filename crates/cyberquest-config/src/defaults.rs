//! Built-in configuration values.

use camino::Utf8PathBuf;

use crate::logging::LogFormat;
use crate::socket::SocketEndpoint;

/// Default TCP port the session server listens on.
pub const DEFAULT_TCP_PORT: u16 = 4210;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default location of the world content file, relative to the working directory.
pub const DEFAULT_WORLD_PATH: &str = "world.yaml";

/// Name of the configuration file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "cyberquest.toml";

/// Default log filter expression used by the binaries.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format for the binaries.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default world content path.
#[must_use]
pub fn default_world_path() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_WORLD_PATH)
}

/// Computes the default listen endpoint for the session server.
#[must_use]
pub fn default_socket_endpoint() -> SocketEndpoint {
    SocketEndpoint::tcp("127.0.0.1", DEFAULT_TCP_PORT)
}
