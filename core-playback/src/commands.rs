//! Remote command routing.
//!
//! Hosts forward lock-screen, headset and media-key events as
//! [`RemoteCommand`]s. Routing decides, from the current status alone, which
//! controller action a command maps to; commands arriving while there is no
//! controllable item are answered with [`CommandStatus::NoActionableItem`]
//! and leave the status untouched.

use crate::status::Status;
use bridge_traits::RemoteCommandKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A command delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "position", rename_all = "snake_case")]
pub enum RemoteCommand {
    Play,
    Pause,
    TogglePlayPause,
    SkipForward,
    SkipBackward,
    ChangePosition(Duration),
}

impl RemoteCommand {
    pub fn kind(&self) -> RemoteCommandKind {
        match self {
            RemoteCommand::Play => RemoteCommandKind::Play,
            RemoteCommand::Pause => RemoteCommandKind::Pause,
            RemoteCommand::TogglePlayPause => RemoteCommandKind::TogglePlayPause,
            RemoteCommand::SkipForward => RemoteCommandKind::SkipForward,
            RemoteCommand::SkipBackward => RemoteCommandKind::SkipBackward,
            RemoteCommand::ChangePosition(_) => RemoteCommandKind::ChangePlaybackPosition,
        }
    }
}

/// Result reported back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Success,
    NoActionableItem,
    /// The controller is shut down and cannot take commands.
    Rejected,
}

/// Controller action a command resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    /// Already in the requested state.
    Acknowledge,
    Play,
    PauseManually,
    /// Already paused; upgrade the pause to a manual one.
    MarkManuallyPaused,
    SkipForward,
    SkipBackward,
    Seek(Duration),
}

/// Map a command to an action, or `None` when there is nothing to act on.
pub fn route(status: &Status, command: RemoteCommand) -> Option<CommandAction> {
    match command {
        RemoteCommand::Play => match status {
            Status::Playing { .. } => Some(CommandAction::Acknowledge),
            Status::Paused { .. } => Some(CommandAction::Play),
            _ => None,
        },
        RemoteCommand::Pause => match status {
            Status::Playing { .. } => Some(CommandAction::PauseManually),
            Status::Paused { .. } => Some(CommandAction::MarkManuallyPaused),
            _ => None,
        },
        RemoteCommand::TogglePlayPause => match status {
            Status::Playing { .. } => route(status, RemoteCommand::Pause),
            Status::Paused { .. } => route(status, RemoteCommand::Play),
            _ => None,
        },
        RemoteCommand::SkipForward => seekable(status).then_some(CommandAction::SkipForward),
        RemoteCommand::SkipBackward => seekable(status).then_some(CommandAction::SkipBackward),
        RemoteCommand::ChangePosition(position) => {
            seekable(status).then_some(CommandAction::Seek(position))
        }
    }
}

fn seekable(status: &Status) -> bool {
    matches!(
        status,
        Status::Playing { .. } | Status::Paused { .. } | Status::Buffering
    )
}
