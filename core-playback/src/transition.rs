//! # Status Transition Function
//!
//! Engine signals are normalised into a small set of [`Trigger`]s and
//! reconciled against the current [`Status`] by [`reconcile`], a pure
//! function. The controller task is the only caller and the only writer of
//! the resulting status.
//!
//! The engine may report rate changes, time-control changes, or both. The two
//! paths are independent and idempotent: either one alone drives the machine
//! to the same target states.
//!
//! | Trigger | Effect |
//! |---|---|
//! | time-control paused | `Playing`/`Buffering` -> `Paused { manually: false }` |
//! | time-control playing | -> `Playing { from_beginning }` unless already playing or `Error` |
//! | time-control waiting | `Paused`/`Playing`/`Buffering` -> `Buffering` |
//! | rate stopped | `Playing` -> `Paused { manually: false }` |
//! | rate running | not `Playing` and not `Error` -> `Playing { from_beginning }` |
//! | item ready | `Preparing` -> seek to start time, or resolve now |
//! | item failed | -> `Error { ItemFailed }` |
//! | item unknown | -> `Error` with no cause |

use crate::error::PlaybackError;
use crate::status::Status;
use bridge_traits::TimeControlStatus;
use std::time::Duration;

/// Normalised engine signal.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    RateChanged { rate: f32 },
    TimeControlChanged(TimeControlStatus),
    ItemReadyToPlay,
    ItemFailed(String),
    ItemUnknown,
}

/// What the controller must do in response to a trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum Reaction {
    /// Nothing changes.
    Stay,
    /// Replace the status.
    Become(Status),
    /// Run the regular `play()` path (engine command plus begin/resume
    /// notification).
    Play,
    /// Seek accurately to the start time, then resolve the preparation.
    SeekToStart(Duration),
}

/// Compute the reaction to `trigger` in `status`.
pub fn reconcile(status: &Status, trigger: &Trigger, from_beginning: bool) -> Reaction {
    match trigger {
        Trigger::TimeControlChanged(TimeControlStatus::Paused) => match status {
            Status::Playing { .. } | Status::Buffering => {
                Reaction::Become(Status::Paused { manually: false })
            }
            Status::Idle
            | Status::Preparing { .. }
            | Status::Paused { .. }
            | Status::Error { .. } => Reaction::Stay,
        },

        Trigger::TimeControlChanged(TimeControlStatus::Playing) => match status {
            Status::Playing { .. } | Status::Error { .. } => Reaction::Stay,
            Status::Idle | Status::Preparing { .. } | Status::Buffering | Status::Paused { .. } => {
                Reaction::Become(Status::Playing { from_beginning })
            }
        },

        Trigger::TimeControlChanged(TimeControlStatus::WaitingToPlayAtSpecifiedRate) => {
            match status {
                Status::Paused { .. } | Status::Playing { .. } | Status::Buffering => {
                    Reaction::Become(Status::Buffering)
                }
                Status::Idle | Status::Preparing { .. } | Status::Error { .. } => Reaction::Stay,
            }
        }

        Trigger::RateChanged { rate } => {
            let stopped = *rate == 0.0;
            match (stopped, status) {
                (true, Status::Playing { .. }) => {
                    Reaction::Become(Status::Paused { manually: false })
                }
                (true, _) => Reaction::Stay,
                (false, Status::Playing { .. } | Status::Error { .. }) => Reaction::Stay,
                (false, _) => Reaction::Become(Status::Playing { from_beginning }),
            }
        }

        Trigger::ItemReadyToPlay => match status {
            Status::Preparing { start_time, .. } if !start_time.is_zero() => {
                Reaction::SeekToStart(*start_time)
            }
            _ => resolve_preparation(status),
        },

        Trigger::ItemFailed(message) => Reaction::Become(Status::Error {
            cause: Some(PlaybackError::ItemFailed(message.clone())),
        }),

        Trigger::ItemUnknown => Reaction::Become(Status::Error { cause: None }),
    }
}

/// Apply the recorded preparation intent.
///
/// Evaluated against the status at the moment of resolution, so a pause
/// issued while the start seek was in flight wins. Anything other than
/// `Preparing` is left alone.
pub fn resolve_preparation(status: &Status) -> Reaction {
    match status {
        Status::Preparing {
            play_when_ready: true,
            ..
        } => Reaction::Play,
        Status::Preparing {
            play_when_ready: false,
            ..
        } => Reaction::Become(Status::Paused { manually: true }),
        _ => Reaction::Stay,
    }
}
