//! Lifecycle events emitted while the server starts.

use tracing::{error, info};

use cyberquest_config::Config;

use crate::bootstrap::BootstrapError;
use crate::world::World;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Receives bootstrap milestones, in the order they happen.
pub trait HealthReporter: Send + Sync {
    /// Bootstrap is about to begin.
    fn bootstrap_starting(&self);

    /// The world file parsed and its scripts were resolved.
    fn world_loaded(&self, config: &Config, world: &World);

    /// Bootstrap completed and the server is ready.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Called instead of [`HealthReporter::bootstrap_succeeded`].
    fn bootstrap_failed(&self, error: &BootstrapError);
}

/// Writes each milestone as an `info` or `error` event with an `event` field.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// A reporter logging under the `health` target.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        info!(target: HEALTH_TARGET, event = "bootstrap_starting", "bootstrapping session server");
    }

    fn world_loaded(&self, config: &Config, world: &World) {
        info!(
            target: HEALTH_TARGET,
            event = "world_loaded",
            path = %config.world_path(),
            default_host = world.default_host(),
            hosts = world.host_ids().count(),
            scripts = world.script_count(),
            "world loaded"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            listen = %config.listen(),
            pacing = %config.pacing(),
            log_format = %config.log_format(),
            "session server bootstrapped"
        );
    }

    fn bootstrap_failed(&self, failure: &BootstrapError) {
        error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %failure,
            "session server bootstrap failed"
        );
    }
}
