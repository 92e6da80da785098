//! # Core Configuration Module
//!
//! Provides configuration management for the playback core.
//!
//! ## Overview
//!
//! A [`CoreConfig`] holds the host bridges a playback controller drives plus
//! the controller's tunable [`ControllerSettings`]. It is built with
//! [`CoreConfigBuilder`], which fails fast when a required capability is
//! missing.
//!
//! ## Required Dependencies
//!
//! - `PlaybackEngine` - The engine that actually decodes and renders media
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `AudioSession` - Route interruptions (desktop default: `LocalAudioSession`)
//! - `RemoteCommandCenter` - Media keys / lock screen (desktop default: `LoggingRemoteCommandCenter`)
//!
//! Without the `desktop-shims` feature a missing optional bridge simply
//! disables the corresponding behaviour.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{ControllerSettings, CoreConfig};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let config = CoreConfig::builder()
//!     .engine(Arc::new(MyEngine::new()))
//!     .forward_skip_interval(Duration::from_secs(10))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // No engine injected
//! let config = CoreConfig::builder()
//!     .build()
//!     .expect("Should fail - missing PlaybackEngine");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{AudioSession, PlaybackEngine, RemoteCommandCenter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Default forward skip interval (seconds).
pub const DEFAULT_FORWARD_SKIP_SECS: u64 = 30;

/// Default backward skip interval (seconds).
pub const DEFAULT_BACKWARD_SKIP_SECS: u64 = 15;

/// Default rate of elapsed-time callbacks (30 Hz).
pub const DEFAULT_PERIODIC_TIME_INTERVAL: Duration = Duration::from_nanos(1_000_000_000 / 30);

/// Default capacity of the notification channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Tunable controller settings.
///
/// Durations are (de)serialized as fractional seconds. Unknown keys are
/// rejected so a misspelt setting never silently falls back to a default.
///
/// ```
/// use core_runtime::config::ControllerSettings;
///
/// let settings = ControllerSettings::from_json(r#"{ "forward_skip_interval": 10.0 }"#).unwrap();
/// assert_eq!(settings.forward_skip_interval.as_secs(), 10);
///
/// assert!(ControllerSettings::from_json(r#"{ "forward_skip": 10.0 }"#).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerSettings {
    /// Interval used by `skip_forward`.
    #[serde(with = "duration_secs")]
    pub forward_skip_interval: Duration,

    /// Interval used by `skip_backward`.
    #[serde(with = "duration_secs")]
    pub backward_skip_interval: Duration,

    /// How often the engine reports the playback position.
    #[serde(with = "duration_secs")]
    pub periodic_time_interval: Duration,

    /// Events buffered per subscriber before it starts lagging.
    pub event_buffer_size: usize,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            forward_skip_interval: Duration::from_secs(DEFAULT_FORWARD_SKIP_SECS),
            backward_skip_interval: Duration::from_secs(DEFAULT_BACKWARD_SKIP_SECS),
            periodic_time_interval: DEFAULT_PERIODIC_TIME_INTERVAL,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl ControllerSettings {
    /// Parse settings from a JSON object; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid controller settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.forward_skip_interval.is_zero() {
            return Err(Error::Config(
                "Forward skip interval must be greater than zero".to_string(),
            ));
        }

        if self.backward_skip_interval.is_zero() {
            return Err(Error::Config(
                "Backward skip interval must be greater than zero".to_string(),
            ));
        }

        if self.periodic_time_interval.is_zero() {
            return Err(Error::Config(
                "Periodic time interval must be greater than zero".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Serde adapter storing a `Duration` as fractional seconds.
pub mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

/// Core configuration for the playback controller.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Playback engine (required)
    pub engine: Arc<dyn PlaybackEngine>,

    /// Audio session delivering route interruptions (optional)
    pub audio_session: Option<Arc<dyn AudioSession>>,

    /// Host remote command center (optional)
    pub remote_commands: Option<Arc<dyn RemoteCommandCenter>>,

    pub settings: ControllerSettings,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("engine", &"PlaybackEngine { ... }")
            .field(
                "audio_session",
                &self.audio_session.as_ref().map(|_| "AudioSession { ... }"),
            )
            .field(
                "remote_commands",
                &self
                    .remote_commands
                    .as_ref()
                    .map(|_| "RemoteCommandCenter { ... }"),
            )
            .field("settings", &self.settings)
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        self.settings.validate()
    }
}

fn engine_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "PlaybackEngine".to_string(),
        message: "A PlaybackEngine implementation is required. \
                 Desktop/headless: inject bridge_desktop::VirtualEngine. \
                 Mobile: inject an adapter around the platform player (AVPlayer/ExoPlayer)."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_audio_session() -> Option<Arc<dyn AudioSession>> {
    use bridge_desktop::LocalAudioSession;

    let session: Arc<dyn AudioSession> = Arc::new(LocalAudioSession::new());
    Some(session)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_audio_session() -> Option<Arc<dyn AudioSession>> {
    None
}

#[cfg(feature = "desktop-shims")]
fn provide_default_remote_commands() -> Option<Arc<dyn RemoteCommandCenter>> {
    use bridge_desktop::LoggingRemoteCommandCenter;

    let center: Arc<dyn RemoteCommandCenter> = Arc::new(LoggingRemoteCommandCenter::default());
    Some(center)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_remote_commands() -> Option<Arc<dyn RemoteCommandCenter>> {
    None
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    engine: Option<Arc<dyn PlaybackEngine>>,
    audio_session: Option<Arc<dyn AudioSession>>,
    remote_commands: Option<Arc<dyn RemoteCommandCenter>>,
    settings: ControllerSettings,
}

impl CoreConfigBuilder {
    /// Sets the playback engine (required).
    pub fn engine(mut self, engine: Arc<dyn PlaybackEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Sets the audio session.
    ///
    /// Interruptions are only observed when a session is available.
    pub fn audio_session(mut self, session: Arc<dyn AudioSession>) -> Self {
        self.audio_session = Some(session);
        self
    }

    /// Sets the host remote command center.
    pub fn remote_commands(mut self, center: Arc<dyn RemoteCommandCenter>) -> Self {
        self.remote_commands = Some(center);
        self
    }

    /// Replaces all settings at once.
    pub fn settings(mut self, settings: ControllerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Default: 30 seconds
    pub fn forward_skip_interval(mut self, interval: Duration) -> Self {
        self.settings.forward_skip_interval = interval;
        self
    }

    /// Default: 15 seconds
    pub fn backward_skip_interval(mut self, interval: Duration) -> Self {
        self.settings.backward_skip_interval = interval;
        self
    }

    /// Default: 1/30 second
    pub fn periodic_time_interval(mut self, interval: Duration) -> Self {
        self.settings.periodic_time_interval = interval;
        self
    }

    /// Default: 100 events
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.settings.event_buffer_size = size;
        self
    }

    /// Builds the final `CoreConfig`.
    ///
    /// Fails with [`Error::CapabilityMissing`] when no engine was provided and
    /// with [`Error::Config`] when a setting is out of range.
    pub fn build(self) -> Result<CoreConfig> {
        let engine = self.engine.ok_or_else(engine_missing_error)?;

        let config = CoreConfig {
            engine,
            audio_session: self.audio_session.or_else(provide_default_audio_session),
            remote_commands: self
                .remote_commands
                .or_else(provide_default_remote_commands),
            settings: self.settings,
        };

        config.validate()?;

        Ok(config)
    }
}
