//! Session server bootstrap orchestration.

use std::sync::Arc;

use thiserror::Error;

use cyberquest_config::{Config, ConfigError, SocketPreparationError};

use crate::commands;
use crate::dispatch::CommandRegistry;
use crate::health::HealthReporter;
use crate::session::SessionEngine;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};
use crate::world::{World, WorldError};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the server configuration.
    fn load(&self) -> Result<Config, ConfigError>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Config::load()
    }
}

/// Loader returning a configuration resolved elsewhere.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Serves `config` on every load.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: ConfigError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The world content could not be loaded.
    #[error("failed to load world content: {source}")]
    World {
        /// Underlying load error.
        #[source]
        source: WorldError,
    },
    /// Socket preparation failed.
    #[error("failed to prepare listen socket: {source}")]
    Socket {
        /// Filesystem error reported while preparing the socket directory.
        #[source]
        source: SocketPreparationError,
    },
}

impl BootstrapError {
    /// The command-line error, when bootstrap failed on argument parsing.
    #[must_use]
    pub fn as_cli(&self) -> Option<&clap::Error> {
        match self {
            Self::Configuration { source } => source.as_cli(),
            Self::Telemetry { .. } | Self::World { .. } | Self::Socket { .. } => None,
        }
    }
}

/// Result of a successful bootstrap: everything a listener needs to serve
/// sessions.
#[derive(Debug)]
pub struct Server {
    config: Config,
    world: Arc<World>,
    registry: Arc<CommandRegistry>,
    telemetry: TelemetryHandle,
}

impl Server {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The loaded world content.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The built-in command table.
    #[must_use]
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Builds a session engine sharing this server's world and registry.
    #[must_use]
    pub fn engine(&self) -> SessionEngine {
        SessionEngine::new(
            Arc::clone(&self.world),
            Arc::clone(&self.registry),
            self.config.pacing(),
        )
    }
}

/// Bootstraps the server using the supplied collaborators.
///
/// # Errors
///
/// Returns [`BootstrapError`] for the first stage that fails; the reporter
/// is told about the failure before it is returned.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: &dyn HealthReporter,
) -> Result<Server, BootstrapError> {
    reporter.bootstrap_starting();
    let result = bootstrap_stages(loader, reporter);
    match &result {
        Ok(server) => reporter.bootstrap_succeeded(server.config()),
        Err(error) => reporter.bootstrap_failed(error),
    }
    result
}

fn bootstrap_stages(
    loader: &dyn ConfigLoader,
    reporter: &dyn HealthReporter,
) -> Result<Server, BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    let telemetry =
        telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;

    let world = World::load(config.world_path())
        .map_err(|source| BootstrapError::World { source })?;
    reporter.world_loaded(&config, &world);

    config
        .listen()
        .prepare_filesystem()
        .map_err(|source| BootstrapError::Socket { source })?;

    Ok(Server {
        config,
        world: Arc::new(world),
        registry: Arc::new(commands::registry()),
        telemetry,
    })
}
