//! Health reporter double that remembers what it was told.

use std::sync::{Mutex, PoisonError};

use cyberquest_config::Config;

use crate::bootstrap::BootstrapError;
use crate::health::HealthReporter;
use crate::world::World;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    /// Number of hosts in the loaded world.
    WorldLoaded(usize),
    BootstrapSucceeded,
    BootstrapFailed(String),
}

#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, event: HealthEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.push(HealthEvent::BootstrapStarting);
    }

    fn world_loaded(&self, _config: &Config, world: &World) {
        self.push(HealthEvent::WorldLoaded(world.host_ids().count()));
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.push(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.push(HealthEvent::BootstrapFailed(error.to_string()));
    }
}
