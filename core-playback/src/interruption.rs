//! Audio-route interruption policy.
//!
//! Decides what to do when an interruption ends, based on the current status
//! and the system's resume hint. The decision is a pure function; the
//! controller clears its interrupted flag before carrying it out so that a
//! resulting `play()` is not swallowed.

use crate::status::Status;
use std::time::Duration;

/// Action chosen when an interruption ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptionAction {
    /// Leave everything as it is.
    None,
    /// Resume through the regular `play()` path.
    Resume,
    /// Status still says playing; tell the engine to play again.
    Resync,
    /// Pause, marking the pause as system-induced.
    Pause,
    /// Rewrite the pending preparation intent.
    Prepare {
        play_when_ready: bool,
        start_time: Duration,
    },
}

/// Decide how to react to the end of an interruption.
///
/// A manual pause is never resumed, whatever the hint says.
pub fn on_interruption_ended(status: &Status, should_resume: Option<bool>) -> InterruptionAction {
    match (status, should_resume) {
        (Status::Playing { .. }, Some(true)) => InterruptionAction::Resync,
        (Status::Playing { .. }, Some(false)) => InterruptionAction::Pause,
        (Status::Playing { .. }, None) => InterruptionAction::Resync,

        (Status::Paused { manually: true }, _) => InterruptionAction::None,
        (Status::Paused { manually: false }, Some(true) | None) => InterruptionAction::Resume,
        (Status::Paused { manually: false }, Some(false)) => InterruptionAction::None,

        (Status::Preparing { start_time, .. }, Some(hint)) => InterruptionAction::Prepare {
            play_when_ready: hint,
            start_time: *start_time,
        },
        (Status::Preparing { .. }, None) => InterruptionAction::None,

        (Status::Idle | Status::Buffering | Status::Error { .. }, _) => InterruptionAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HINTS: [Option<bool>; 3] = [Some(true), Some(false), None];

    #[test]
    fn test_manual_pause_is_sticky() {
        for hint in HINTS {
            assert_eq!(
                on_interruption_ended(&Status::Paused { manually: true }, hint),
                InterruptionAction::None
            );
        }
    }

    #[test]
    fn test_system_pause_resumes_unless_told_not_to() {
        let status = Status::Paused { manually: false };
        assert_eq!(
            on_interruption_ended(&status, Some(true)),
            InterruptionAction::Resume
        );
        assert_eq!(
            on_interruption_ended(&status, Some(false)),
            InterruptionAction::None
        );
        assert_eq!(on_interruption_ended(&status, None), InterruptionAction::Resume);
    }

    #[test]
    fn test_playing() {
        let status = Status::Playing {
            from_beginning: false,
        };
        assert_eq!(
            on_interruption_ended(&status, Some(true)),
            InterruptionAction::Resync
        );
        assert_eq!(
            on_interruption_ended(&status, Some(false)),
            InterruptionAction::Pause
        );
        assert_eq!(on_interruption_ended(&status, None), InterruptionAction::Resync);
    }

    #[test]
    fn test_preparing_takes_hint_and_keeps_start_time() {
        let status = Status::Preparing {
            play_when_ready: true,
            start_time: Duration::from_secs(30),
        };

        assert_eq!(
            on_interruption_ended(&status, Some(false)),
            InterruptionAction::Prepare {
                play_when_ready: false,
                start_time: Duration::from_secs(30),
            }
        );
        assert_eq!(on_interruption_ended(&status, None), InterruptionAction::None);
    }

    #[test]
    fn test_inert_states() {
        for status in [
            Status::Idle,
            Status::Buffering,
            Status::Error { cause: None },
        ] {
            for hint in HINTS {
                assert_eq!(
                    on_interruption_ended(&status, hint),
                    InterruptionAction::None
                );
            }
        }
    }
}
