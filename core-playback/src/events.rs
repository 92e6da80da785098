//! # Playback Event Bus
//!
//! Broadcasts controller notifications using `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! - **Notifications**: [`PlaybackNotification`], one variant per named event
//! - **ControllerEvent**: a notification tagged with the emitting controller
//! - **EventBus**: broadcast channel the controller task publishes on
//! - **EventStream**: receiver wrapper with filtering by notification name
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐  emit   ┌───────────┐   subscribe   ┌────────────┐
//! │ controller task  ├────────>│ EventBus  ├──────────────>│ UI         │
//! └──────────────────┘         │ (broadcast│               └────────────┘
//!          │                   │  channel) │   subscribe   ┌────────────┐
//!          │ publish first     │           ├──────────────>│ Now playing│
//!          v                   └───────────┘               └────────────┘
//! ┌──────────────────┐
//! │ watch<Snapshot>  │
//! └──────────────────┘
//! ```
//!
//! The controller publishes the new snapshot before it emits the event that
//! announces it, so any subscriber that reads state in response to an event
//! sees settled values. Events are emitted in mutation order and never
//! coalesced.
//!
//! ## Usage
//!
//! ```rust
//! use core_playback::events::{ControllerEvent, ControllerId, EventBus, EventStream, NotificationName, PlaybackNotification};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(100);
//! let mut statuses = EventStream::new(bus.subscribe()).only(&[NotificationName::DidUpdateStatus]);
//!
//! let controller = ControllerId::new();
//! bus.emit(ControllerEvent::new(controller, PlaybackNotification::DidBeginPlayback)).ok();
//! bus.emit(ControllerEvent::new(
//!     controller,
//!     PlaybackNotification::DidUpdateStatus { status: Default::default() },
//! )).ok();
//!
//! let event = statuses.recv().await.unwrap();
//! assert_eq!(event.name(), NotificationName::DidUpdateStatus);
//! # }
//! ```

use crate::status::Status;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError, error::SendError, Receiver};
use uuid::Uuid;

/// Default event buffer size
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = core_runtime::config::DEFAULT_EVENT_BUFFER_SIZE;

// ============================================================================
// Event Types
// ============================================================================

/// Identifies the controller instance that emitted an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControllerId(Uuid);

impl ControllerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ControllerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Named notifications emitted by a playback controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlaybackNotification {
    /// First `play()` since the last stop.
    DidBeginPlayback,
    DidPausePlayback,
    DidResumePlayback,
    /// A stop that began while playing or buffering finished its rewind.
    DidStopPlayback,
    WillChangePosition,
    DidChangePosition,
    DidUpdateElapsedTime {
        elapsed: Duration,
    },
    DidUpdateDuration {
        duration: Option<Duration>,
    },
    DidUpdateStatus {
        status: Status,
    },
    DidPlayToEnd,
    WillChangeSource,
    DidChangeSource,
}

/// Payload-free notification name, for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationName {
    DidBeginPlayback,
    DidPausePlayback,
    DidResumePlayback,
    DidStopPlayback,
    WillChangePosition,
    DidChangePosition,
    DidUpdateElapsedTime,
    DidUpdateDuration,
    DidUpdateStatus,
    DidPlayToEnd,
    WillChangeSource,
    DidChangeSource,
}

impl PlaybackNotification {
    pub fn name(&self) -> NotificationName {
        match self {
            PlaybackNotification::DidBeginPlayback => NotificationName::DidBeginPlayback,
            PlaybackNotification::DidPausePlayback => NotificationName::DidPausePlayback,
            PlaybackNotification::DidResumePlayback => NotificationName::DidResumePlayback,
            PlaybackNotification::DidStopPlayback => NotificationName::DidStopPlayback,
            PlaybackNotification::WillChangePosition => NotificationName::WillChangePosition,
            PlaybackNotification::DidChangePosition => NotificationName::DidChangePosition,
            PlaybackNotification::DidUpdateElapsedTime { .. } => {
                NotificationName::DidUpdateElapsedTime
            }
            PlaybackNotification::DidUpdateDuration { .. } => NotificationName::DidUpdateDuration,
            PlaybackNotification::DidUpdateStatus { .. } => NotificationName::DidUpdateStatus,
            PlaybackNotification::DidPlayToEnd => NotificationName::DidPlayToEnd,
            PlaybackNotification::WillChangeSource => NotificationName::WillChangeSource,
            PlaybackNotification::DidChangeSource => NotificationName::DidChangeSource,
        }
    }

    /// Returns a human-readable description of the notification.
    pub fn description(&self) -> &'static str {
        match self {
            PlaybackNotification::DidBeginPlayback => "Playback began",
            PlaybackNotification::DidPausePlayback => "Playback paused",
            PlaybackNotification::DidResumePlayback => "Playback resumed",
            PlaybackNotification::DidStopPlayback => "Playback stopped",
            PlaybackNotification::WillChangePosition => "Position about to change",
            PlaybackNotification::DidChangePosition => "Position changed",
            PlaybackNotification::DidUpdateElapsedTime { .. } => "Elapsed time updated",
            PlaybackNotification::DidUpdateDuration { .. } => "Duration updated",
            PlaybackNotification::DidUpdateStatus { .. } => "Status updated",
            PlaybackNotification::DidPlayToEnd => "Played to end",
            PlaybackNotification::WillChangeSource => "Source about to change",
            PlaybackNotification::DidChangeSource => "Source changed",
        }
    }
}

/// A notification tagged with the controller that emitted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerEvent {
    pub controller: ControllerId,
    pub notification: PlaybackNotification,
}

impl ControllerEvent {
    pub fn new(controller: ControllerId, notification: PlaybackNotification) -> Self {
        Self {
            controller,
            notification,
        }
    }

    pub fn name(&self) -> NotificationName {
        self.notification.name()
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Broadcast channel carrying [`ControllerEvent`]s.
///
/// Slow subscribers that fall more than `capacity` events behind receive
/// `RecvError::Lagged` and lose the overwritten events. The controller's
/// `watch()` snapshot is never lossy; re-read it after a lag.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ControllerEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; [`ControllerSettings`] validation rejects
    /// a zero buffer before a bus is built.
    ///
    /// [`ControllerSettings`]: core_runtime::config::ControllerSettings
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// when nobody is listening.
    pub fn emit(&self, event: ControllerEvent) -> Result<usize, SendError<ControllerEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<ControllerEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&ControllerEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` with optional filtering.
///
/// Events are delivered in emission order, but a subscriber that falls
/// behind the bus capacity skips the oldest ones (see [`EventStream::recv`]).
/// Settled state is always available losslessly from the controller's
/// `watch()` snapshot, which is published before each event is emitted.
pub struct EventStream {
    receiver: Receiver<ControllerEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<ControllerEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only yield events matching `predicate`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&ControllerEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Only yield events with one of the given names.
    pub fn only(self, names: &[NotificationName]) -> Self {
        let names = names.to_vec();
        self.filter(move |event| names.contains(&event.name()))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n`
    /// events, and `RecvError::Closed` once the controller is gone. After a
    /// lag the stream continues with the oldest retained event; read the
    /// snapshot to catch up on state.
    pub async fn recv(&mut self) -> Result<ControllerEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching event is currently available.
    pub fn try_recv(&mut self) -> Option<Result<ControllerEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    let Some(filter) = &self.filter else {
                        return Some(Ok(event));
                    };

                    if filter(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
