//! # Host Bridge Traits
//!
//! Capability contracts that each host platform implements for the playback
//! core.
//!
//! ## Traits
//!
//! ### Media
//! - [`PlaybackEngine`](playback::PlaybackEngine) - Loads sources, plays, pauses, seeks
//! - [`EngineSignalStream`](playback::EngineSignalStream) - Typed engine property changes
//!
//! ### Platform Integration
//! - [`AudioSession`](session::AudioSession) - Playback category and route interruptions
//! - [`RemoteCommandCenter`](remote::RemoteCommandCenter) - Lock-screen / media-key registration
//!
//! ### Utilities
//! - [`LoggerSink`](log::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop / headless | `bridge-desktop` | ✅ Virtual engine |
//! | iOS      | TBD                 | 📋 Planned |
//! | Android  | TBD                 | 📋 Planned |
//!
//! ## Fail-Fast Strategy
//!
//! The core refuses to start without a [`PlaybackEngine`]:
//!
//! ```ignore
//! let config = CoreConfig::builder().build()?; // Err(CapabilityMissing { capability: "PlaybackEngine", .. })
//! ```
//!
//! ## Thread Safety
//!
//! Every bridge trait requires `Send + Sync`. Engine signals and interruption
//! events may be produced on any thread; the core marshals them onto its own
//! single owning task before acting on them.

pub mod error;
pub mod log;
pub mod playback;
pub mod remote;
pub mod session;

pub use error::BridgeError;

// Re-export commonly used types
pub use log::{LogEntry, LogLevel, LoggerSink};
pub use playback::{
    EngineSignal, EngineSignalStream, ItemId, ItemStatus, MediaKind, MediaLocator, MediaSource,
    PlaybackEngine, SeekTolerance, TimeControlStatus,
};
pub use remote::{RemoteCommandCenter, RemoteCommandKind, RemoteCommandRegistration};
pub use session::{AudioSession, InterruptionEvent, InterruptionStream};
