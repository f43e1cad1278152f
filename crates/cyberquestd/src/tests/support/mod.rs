//! Test harness utilities for the session server suites.

mod client;
mod config_loader;
mod log;
mod reporter;

pub use client::TestClient;
pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use log::CapturedLog;
pub use reporter::{HealthEvent, RecordingHealthReporter};
