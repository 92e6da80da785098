//! Audio Session Abstractions
//!
//! Hosts route system audio interruptions (phone calls, alarms, another app
//! taking the output) to the core through [`AudioSession`].

use crate::error::Result;

/// A system audio-route interruption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptionEvent {
    /// Another client took the audio route; the engine has stopped producing
    /// sound.
    Began,
    /// The interruption is over.
    ///
    /// `should_resume` carries the system's resume hint when the platform
    /// provides one, and is `None` when the signal arrived without options.
    Ended { should_resume: Option<bool> },
}

/// Stream of interruption events.
#[async_trait::async_trait]
pub trait InterruptionStream: Send {
    /// Get the next interruption event.
    ///
    /// Returns `None` when the session is torn down.
    async fn next(&mut self) -> Option<InterruptionEvent>;
}

/// Host audio session.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::session::{AudioSession, InterruptionEvent};
///
/// async fn watch(session: &dyn AudioSession) {
///     let mut events = session.interruptions();
///     while let Some(event) = events.next().await {
///         println!("{:?}", event);
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait AudioSession: Send + Sync {
    /// Put the session into the playback category so output continues while
    /// the host is in the background.
    async fn activate_playback_category(&self) -> Result<()>;

    /// Subscribe to interruption events.
    fn interruptions(&self) -> Box<dyn InterruptionStream>;
}
