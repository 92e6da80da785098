//! Clock bridge: turns raw engine time readings into `elapsed_time` and
//! `duration` updates.
//!
//! Engines report times as floating-point seconds that may be NaN or
//! infinite while no meaningful value exists. Invalid position readings are
//! dropped; an invalid duration reading clears the duration.

use std::time::Duration;

/// Default interval between periodic position callbacks (30 Hz).
pub const DEFAULT_TICK_INTERVAL: Duration = core_runtime::config::DEFAULT_PERIODIC_TIME_INTERVAL;

/// Convert an engine reading to a `Duration`.
///
/// Returns `None` for NaN, infinite, negative or overflowing readings.
pub fn seconds_to_duration(seconds: f64) -> Option<Duration> {
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(seconds).ok()
}

/// Tracks the last published elapsed time and duration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackClock {
    elapsed: Duration,
    duration: Option<Duration>,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Apply a periodic position reading.
    ///
    /// Returns the new elapsed time when the reading was valid and differs
    /// from the current value.
    pub fn position_tick(&mut self, seconds: f64) -> Option<Duration> {
        let elapsed = seconds_to_duration(seconds)?;
        self.set_elapsed(elapsed).then_some(elapsed)
    }

    /// Apply a duration reading. Non-numeric readings clear the duration.
    ///
    /// Returns `Some(new_duration)` when the stored value changed.
    pub fn duration_reading(&mut self, seconds: f64) -> Option<Option<Duration>> {
        let duration = seconds_to_duration(seconds);
        if duration == self.duration {
            return None;
        }
        self.duration = duration;
        Some(duration)
    }

    /// Limit a position to the known duration. Unknown or live durations
    /// leave it unchanged.
    pub fn clamp(&self, position: Duration) -> Duration {
        match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        }
    }

    /// Set the elapsed time directly (seek completion, stop).
    ///
    /// Returns whether the value changed.
    pub fn set_elapsed(&mut self, elapsed: Duration) -> bool {
        if elapsed == self.elapsed {
            return false;
        }
        self.elapsed = elapsed;
        true
    }
}
