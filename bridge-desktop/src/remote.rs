//! Remote Command Center Implementation

use bridge_traits::{
    error::Result,
    remote::{RemoteCommandCenter, RemoteCommandRegistration},
};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::info;

#[derive(Default)]
struct CenterState {
    registration: Option<RemoteCommandRegistration>,
    preferred_skip_intervals: Option<(Duration, Duration)>,
}

/// Command center for hosts without lock-screen integration.
///
/// Records what the core asked for and logs it. Hosts wiring media keys
/// themselves can read [`registration`](Self::registration) to decide which
/// keys to forward.
#[derive(Default)]
pub struct LoggingRemoteCommandCenter {
    state: Mutex<CenterState>,
}

impl LoggingRemoteCommandCenter {
    fn state(&self) -> MutexGuard<'_, CenterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The active registration, if commands are registered.
    pub fn registration(&self) -> Option<RemoteCommandRegistration> {
        self.state().registration.clone()
    }

    /// Last `(forward, backward)` skip intervals the core advertised.
    pub fn preferred_skip_intervals(&self) -> Option<(Duration, Duration)> {
        self.state().preferred_skip_intervals
    }
}

impl RemoteCommandCenter for LoggingRemoteCommandCenter {
    fn register(&self, registration: &RemoteCommandRegistration) -> Result<()> {
        info!(
            commands = ?registration.enabled,
            forward = ?registration.forward_skip_interval,
            backward = ?registration.backward_skip_interval,
            "Remote commands registered"
        );
        let mut state = self.state();
        state.preferred_skip_intervals = Some((
            registration.forward_skip_interval,
            registration.backward_skip_interval,
        ));
        state.registration = Some(registration.clone());
        Ok(())
    }

    fn unregister(&self) -> Result<()> {
        if self.state().registration.take().is_some() {
            info!("Remote commands unregistered");
        }
        Ok(())
    }

    fn set_preferred_skip_intervals(&self, forward: Duration, backward: Duration) -> Result<()> {
        info!(forward = ?forward, backward = ?backward, "Preferred skip intervals updated");
        let mut state = self.state();
        state.preferred_skip_intervals = Some((forward, backward));
        if let Some(registration) = state.registration.as_mut() {
            registration.forward_skip_interval = forward;
            registration.backward_skip_interval = backward;
        }
        Ok(())
    }
}
