//! Playback engine bridge traits and supporting media types.
//!
//! The playback controller never decodes or renders media itself. It drives a
//! host-provided engine (AVPlayer, GStreamer, ExoPlayer, a software mixer...)
//! through [`PlaybackEngine`] and learns about the engine's progress through a
//! typed [`EngineSignalStream`]. Adapters translate whatever observation
//! mechanism the platform uses (KVO, callbacks, bus messages) into
//! [`EngineSignal`] values.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Whether a source carries audio-only or video content.
///
/// Only audio sources take part in audio-session interruption handling and
/// remote command registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

/// Where the engine should load media from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaLocator {
    /// Local file accessible to the host runtime.
    LocalFile { path: PathBuf },
    /// Remote HTTP(S) stream to be fetched by the engine.
    RemoteStream {
        url: String,
        #[serde(default)]
        headers: HashMap<String, String>,
    },
}

/// A source handed to `prepare_to_play`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSource {
    pub kind: MediaKind,
    pub locator: MediaLocator,
}

impl MediaSource {
    /// Audio file on the local file system.
    pub fn audio_file(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: MediaKind::Audio,
            locator: MediaLocator::LocalFile { path: path.into() },
        }
    }

    /// Remote audio stream without extra request headers.
    pub fn audio_stream(url: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Audio,
            locator: MediaLocator::RemoteStream {
                url: url.into(),
                headers: HashMap::new(),
            },
        }
    }

    /// Video file on the local file system.
    pub fn video_file(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: MediaKind::Video,
            locator: MediaLocator::LocalFile { path: path.into() },
        }
    }

    pub fn is_audio(&self) -> bool {
        self.kind == MediaKind::Audio
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.locator, MediaLocator::RemoteStream { .. })
    }
}

/// Identifier of an item the engine has loaded and may attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(Uuid);

impl ItemId {
    /// Generate a new item identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Construct an identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How far the engine may land from the requested seek target.
///
/// `None` on either side lets the engine apply its own default snapping
/// tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekTolerance {
    pub before: Option<Duration>,
    pub after: Option<Duration>,
}

impl SeekTolerance {
    /// Frame-exact seeking.
    pub const EXACT: SeekTolerance = SeekTolerance {
        before: Some(Duration::ZERO),
        after: Some(Duration::ZERO),
    };

    /// Engine-default tolerance (fast, may snap to a keyframe).
    pub const ENGINE_DEFAULT: SeekTolerance = SeekTolerance {
        before: None,
        after: None,
    };

    pub fn is_exact(&self) -> bool {
        *self == Self::EXACT
    }
}

/// The engine's own classification of what playback is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeControlStatus {
    Paused,
    WaitingToPlayAtSpecifiedRate,
    Playing,
}

/// Readiness of the currently attached item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    ReadyToPlay,
    Failed { message: String },
    Unknown,
}

/// Property changes reported by the engine.
///
/// Times are raw engine readings in seconds; they may be non-finite while the
/// engine has no meaningful value (e.g. an indefinite live-stream duration).
#[derive(Debug, Clone, PartialEq)]
pub enum EngineSignal {
    /// Playback rate changed (`0.0` means stopped).
    Rate(f32),
    /// Aggregate time-control status changed.
    TimeControl(TimeControlStatus),
    /// Readiness of an item changed.
    ItemStatus { item: ItemId, status: ItemStatus },
    /// Duration of an item became known or changed.
    ItemDuration { item: ItemId, seconds: f64 },
    /// Periodic position callback.
    Position { item: ItemId, seconds: f64 },
    /// Item played through to its end.
    PlayedToEnd { item: ItemId },
}

/// Stream of engine signals.
#[async_trait::async_trait]
pub trait EngineSignalStream: Send {
    /// Get the next signal.
    ///
    /// Returns `None` when the engine has shut down.
    async fn next(&mut self) -> Option<EngineSignal>;
}

/// Trait for platform-specific playback engines.
///
/// Implementations own decoding and rendering. All methods must return
/// promptly; long-running work (`load`, `seek`) completes asynchronously and
/// the caller decides whether to await it inline or on a spawned task.
#[async_trait::async_trait]
pub trait PlaybackEngine: Send + Sync {
    /// Load a source, checking playability, and prepare an item for it.
    ///
    /// The returned item is not attached until
    /// [`replace_current_item`](Self::replace_current_item) is called.
    async fn load(&self, source: &MediaSource) -> Result<ItemId>;

    /// Attach an item (or detach with `None`).
    async fn replace_current_item(&self, item: Option<ItemId>) -> Result<()>;

    /// Begin or resume playback of the attached item.
    async fn play(&self) -> Result<()>;

    /// Pause playback without detaching the item.
    async fn pause(&self) -> Result<()>;

    /// Seek the given item. Resolves to `false` when the engine cancelled the
    /// seek (typically because a newer seek superseded it).
    async fn seek(&self, item: ItemId, position: Duration, tolerance: SeekTolerance)
        -> Result<bool>;

    /// Interval at which [`EngineSignal::Position`] is reported.
    fn set_periodic_time_interval(&self, interval: Duration);

    /// Whether the engine should delay playback to minimise stalling.
    fn set_automatically_waits_to_minimize_stalling(&self, enabled: bool);

    /// Subscribe to engine signals.
    fn signals(&self) -> Box<dyn EngineSignalStream>;
}
