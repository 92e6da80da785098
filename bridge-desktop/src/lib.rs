//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop and headless hosts
//! (macOS, Windows, Linux, CI).
//!
//! ## Overview
//!
//! Desktop hosts have no system media stack the core can drive directly, so
//! this crate provides stand-ins that behave like one:
//! - `PlaybackEngine` as a timer-driven `VirtualEngine` over a registry of
//!   known media
//! - `AudioSession` as `LocalAudioSession`, with interruptions injected by
//!   the host
//! - `RemoteCommandCenter` as `LoggingRemoteCommandCenter`, which records and
//!   logs registrations
//! - `LoggerSink` as `ConsoleLogger`, writing to stderr
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{VirtualEngine, VirtualMedia};
//! use bridge_traits::MediaSource;
//! use std::time::Duration;
//!
//! let engine = VirtualEngine::new();
//! engine.register(
//!     &MediaSource::audio_file("/music/track.mp3"),
//!     VirtualMedia::with_duration(Duration::from_secs(180)),
//! );
//!
//! // Use in core configuration
//! let config = CoreConfig::builder().engine(Arc::new(engine)).build()?;
//! ```

mod engine;
mod logger;
mod remote;
mod session;

pub use engine::{VirtualEngine, VirtualMedia};
pub use logger::ConsoleLogger;
pub use remote::LoggingRemoteCommandCenter;
pub use session::LocalAudioSession;
