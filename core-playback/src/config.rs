//! # Playback Configuration
//!
//! Options accepted by `prepare_to_play`.

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-source playback options.
///
/// Only the recognised keys are accepted when parsing; an unknown key is a
/// construction-time error rather than a silently ignored option.
///
/// ```
/// use core_playback::PlaybackConfiguration;
/// use std::time::Duration;
///
/// let config = PlaybackConfiguration::from_json(r#"{ "play_when_ready": true, "start_time": 30.0 }"#).unwrap();
/// assert!(config.play_when_ready);
/// assert_eq!(config.start_time, Duration::from_secs(30));
/// assert!(config.automatically_waits_to_minimize_stalling);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlaybackConfiguration {
    /// Start playing as soon as the item is ready.
    ///
    /// Default: false.
    #[serde(default)]
    pub play_when_ready: bool,

    /// Position to seek to (accurately) before the item is first played or
    /// paused.
    ///
    /// Default: zero.
    #[serde(default, with = "core_runtime::config::duration_secs")]
    pub start_time: Duration,

    /// Whether the engine should delay playback to minimise stalling.
    ///
    /// Default: true.
    #[serde(default = "default_automatically_waits")]
    pub automatically_waits_to_minimize_stalling: bool,
}

impl Default for PlaybackConfiguration {
    fn default() -> Self {
        Self {
            play_when_ready: false,
            start_time: Duration::ZERO,
            automatically_waits_to_minimize_stalling: default_automatically_waits(),
        }
    }
}

impl PlaybackConfiguration {
    /// Configuration that starts playback as soon as the item is ready.
    pub fn autoplay() -> Self {
        Self {
            play_when_ready: true,
            ..Default::default()
        }
    }

    pub fn with_play_when_ready(mut self, play_when_ready: bool) -> Self {
        self.play_when_ready = play_when_ready;
        self
    }

    pub fn with_start_time(mut self, start_time: Duration) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn with_automatically_waits_to_minimize_stalling(mut self, enabled: bool) -> Self {
        self.automatically_waits_to_minimize_stalling = enabled;
        self
    }

    /// Parse a configuration from a JSON object.
    ///
    /// Missing keys take their defaults; unknown keys and negative start
    /// times are rejected.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| PlaybackError::InvalidConfiguration(e.to_string()))
    }

    /// Parse a configuration from an already decoded JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| PlaybackError::InvalidConfiguration(e.to_string()))
    }
}

fn default_automatically_waits() -> bool {
    true
}
