//! Controller status and the settled snapshot published to readers.

use crate::error::PlaybackError;
use bridge_traits::MediaSource;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// The authoritative playback status.
///
/// Exactly one value exists per controller and it is only ever replaced
/// whole, so readers never observe a partially updated status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Status {
    /// No source loaded.
    #[default]
    Idle,

    /// A source is loading. The intent recorded here is applied once the
    /// engine reports the item ready.
    Preparing {
        play_when_ready: bool,
        start_time: Duration,
    },

    /// Audio or video is playing. `from_beginning` is true only for the first
    /// playing transition after a full stop.
    Playing { from_beginning: bool },

    /// The engine is waiting to reach its target rate.
    Buffering,

    /// Playback is paused. `manually` marks a user/command pause, which is
    /// never resumed automatically.
    Paused { manually: bool },

    /// Unrecoverable until the next `prepare_to_play`.
    Error { cause: Option<PlaybackError> },
}

impl Status {
    pub fn is_playing(&self) -> bool {
        matches!(self, Status::Playing { .. })
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, Status::Paused { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Status::Error { .. })
    }

    /// Whether playback commands have something to act on.
    ///
    /// `Idle`, `Preparing` and `Error` carry no controllable item.
    pub fn has_actionable_item(&self) -> bool {
        !matches!(
            self,
            Status::Idle | Status::Preparing { .. } | Status::Error { .. }
        )
    }

    /// Short lowercase name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Status::Idle => "idle",
            Status::Preparing { .. } => "preparing",
            Status::Playing { .. } => "playing",
            Status::Buffering => "buffering",
            Status::Paused { .. } => "paused",
            Status::Error { .. } => "error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Preparing {
                play_when_ready,
                start_time,
            } => write!(
                f,
                "preparing(play_when_ready: {}, start_time: {:?})",
                play_when_ready, start_time
            ),
            Status::Playing { from_beginning } => {
                write!(f, "playing(from_beginning: {})", from_beginning)
            }
            Status::Paused { manually } => write!(f, "paused(manually: {})", manually),
            Status::Error { cause: Some(cause) } => write!(f, "error({})", cause),
            other => f.write_str(other.name()),
        }
    }
}

/// Settled observable state of a controller.
///
/// Published on a `watch` channel before the matching notification is
/// broadcast, so a subscriber reacting to an event always reads the value the
/// event announced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackSnapshot {
    pub status: Status,
    pub elapsed_time: Duration,
    pub duration: Option<Duration>,
    pub source: Option<MediaSource>,
}
