//! Output pacing modes.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Controls whether command output is paced with the scripted delays.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Pacing {
    /// Honour every delay, so output trickles in like a slow remote link.
    #[default]
    Realtime,
    /// Skip all delays. Used by tests and scripted sessions.
    Instant,
}

impl Pacing {
    /// Blocks the calling session for `duration` when pacing is enabled.
    pub fn pause(self, duration: Duration) {
        if self == Self::Realtime && !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }

    /// Convenience wrapper around [`Pacing::pause`] taking milliseconds.
    pub fn pause_millis(self, millis: u64) {
        self.pause(Duration::from_millis(millis));
    }
}
