//! Remote Command Center
//!
//! Lock-screen controls, headset buttons and media keys reach the core
//! through a host command center. The core only tells the host which commands
//! it handles and which skip intervals to advertise; the host forwards the
//! actual command events back into the playback controller.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Commands a host may deliver to the playback controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteCommandKind {
    Play,
    Pause,
    TogglePlayPause,
    SkipForward,
    SkipBackward,
    ChangePlaybackPosition,
}

impl RemoteCommandKind {
    /// All commands the playback controller can handle.
    pub const ALL: [RemoteCommandKind; 6] = [
        RemoteCommandKind::Play,
        RemoteCommandKind::Pause,
        RemoteCommandKind::TogglePlayPause,
        RemoteCommandKind::SkipForward,
        RemoteCommandKind::SkipBackward,
        RemoteCommandKind::ChangePlaybackPosition,
    ];
}

/// Registration handed to the host when a controllable item is attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCommandRegistration {
    /// Commands to enable. Everything else should be disabled by the host.
    pub enabled: Vec<RemoteCommandKind>,
    /// Preferred forward skip interval.
    pub forward_skip_interval: Duration,
    /// Preferred backward skip interval.
    pub backward_skip_interval: Duration,
}

impl RemoteCommandRegistration {
    /// Registration enabling every supported command.
    pub fn all(forward_skip_interval: Duration, backward_skip_interval: Duration) -> Self {
        Self {
            enabled: RemoteCommandKind::ALL.to_vec(),
            forward_skip_interval,
            backward_skip_interval,
        }
    }

    pub fn is_enabled(&self, kind: RemoteCommandKind) -> bool {
        self.enabled.contains(&kind)
    }
}

/// Host remote command center.
pub trait RemoteCommandCenter: Send + Sync {
    /// Enable the given commands and advertise the skip intervals.
    fn register(&self, registration: &RemoteCommandRegistration) -> Result<()>;

    /// Remove every handler previously registered.
    fn unregister(&self) -> Result<()>;

    /// Update the advertised skip intervals.
    fn set_preferred_skip_intervals(&self, forward: Duration, backward: Duration) -> Result<()>;
}
