//! Local Audio Session Implementation

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    session::{AudioSession, InterruptionEvent, InterruptionStream},
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

const INTERRUPTION_BUFFER: usize = 16;

/// Desktop audio session.
///
/// Desktop platforms do not take the audio route away from an application,
/// so interruptions only happen when the host injects them (for example from
/// a "do not disturb" hook or a conferencing app integration).
#[derive(Clone)]
pub struct LocalAudioSession {
    sender: broadcast::Sender<InterruptionEvent>,
    active: Arc<AtomicBool>,
}

impl LocalAudioSession {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(INTERRUPTION_BUFFER);
        Self {
            sender,
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Deliver an interruption to every subscriber.
    pub fn interrupt(&self, event: InterruptionEvent) {
        info!(event = ?event, "Injecting audio interruption");
        if self.sender.send(event).is_err() {
            debug!("No interruption subscribers");
        }
    }

    pub fn begin_interruption(&self) {
        self.interrupt(InterruptionEvent::Began);
    }

    pub fn end_interruption(&self, should_resume: Option<bool>) {
        self.interrupt(InterruptionEvent::Ended { should_resume });
    }

    /// Whether the playback category has been activated.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl Default for LocalAudioSession {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioSession for LocalAudioSession {
    async fn activate_playback_category(&self) -> Result<()> {
        self.active.store(true, Ordering::SeqCst);
        debug!("Playback audio category activated");
        Ok(())
    }

    fn interruptions(&self) -> Box<dyn InterruptionStream> {
        Box::new(LocalInterruptionStream {
            receiver: self.sender.subscribe(),
        })
    }
}

struct LocalInterruptionStream {
    receiver: broadcast::Receiver<InterruptionEvent>,
}

#[async_trait]
impl InterruptionStream for LocalInterruptionStream {
    async fn next(&mut self) -> Option<InterruptionEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Interruption subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
