//! # Seek Coordinator
//!
//! Serialises seek requests against the engine's asynchronous seek
//! completion.
//!
//! Each request gets a new generation number and supersedes whatever seek was
//! pending. The superseded engine operation is allowed to run to completion,
//! but when its result comes back the generation no longer matches and the
//! result is discarded: its [`SeekCompletion`] resolves to `false` and no
//! position notification fires.

use bridge_traits::SeekTolerance;
use futures::FutureExt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;

/// Resolves once a seek request is settled.
///
/// `true` means the seek completed and was the newest request; `false` means
/// it was superseded, cancelled by the engine, or the controller shut down.
#[derive(Debug)]
#[must_use = "a SeekCompletion does nothing unless awaited or dropped"]
pub struct SeekCompletion {
    receiver: oneshot::Receiver<bool>,
}

impl SeekCompletion {
    /// Create a completion and the sender that settles it.
    pub fn channel() -> (oneshot::Sender<bool>, Self) {
        let (sender, receiver) = oneshot::channel();
        (sender, Self { receiver })
    }
}

impl Future for SeekCompletion {
    type Output = bool;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<bool> {
        self.receiver.poll_unpin(cx).map(|result| result.unwrap_or(false))
    }
}

/// Work the controller performs after a seek completes, before the
/// `DidChangePosition` notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterSeek {
    Nothing,
    /// Finish a `stop()`: reset elapsed time, then announce the stop and/or
    /// the end of the item.
    FinishStop { announce: bool, played_to_end: bool },
}

/// What the engine should be asked to do for a new seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekTicket {
    pub generation: u64,
    pub target: Duration,
    pub tolerance: SeekTolerance,
}

/// A seek whose engine result matched the newest generation.
#[derive(Debug)]
pub struct SettledSeek {
    pub target: Duration,
    pub finished: bool,
    pub after: AfterSeek,
    notifier: oneshot::Sender<bool>,
}

impl SettledSeek {
    /// Resolve the caller's [`SeekCompletion`] with the engine outcome.
    pub fn resolve(self) {
        // The caller may have dropped its completion.
        let _ = self.notifier.send(self.finished);
    }
}

#[derive(Debug)]
struct PendingSeek {
    generation: u64,
    target: Duration,
    after: AfterSeek,
    notifier: oneshot::Sender<bool>,
}

/// Generation-counting seek bookkeeping. Owned by the controller task.
#[derive(Debug, Default)]
pub struct SeekCoordinator {
    generation: u64,
    pending: Option<PendingSeek>,
}

impl SeekCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new seek, superseding any pending one.
    pub fn begin(
        &mut self,
        target: Duration,
        accurate: bool,
        after: AfterSeek,
        notifier: oneshot::Sender<bool>,
    ) -> SeekTicket {
        self.generation += 1;

        if let Some(previous) = self.pending.take() {
            tracing::debug!(
                superseded = previous.generation,
                generation = self.generation,
                "Seek superseded"
            );
            let _ = previous.notifier.send(false);
        }

        self.pending = Some(PendingSeek {
            generation: self.generation,
            target,
            after,
            notifier,
        });

        SeekTicket {
            generation: self.generation,
            target,
            tolerance: if accurate {
                SeekTolerance::EXACT
            } else {
                SeekTolerance::ENGINE_DEFAULT
            },
        }
    }

    /// Match an engine result against the pending seek.
    ///
    /// Returns `None` for stale generations.
    pub fn complete(&mut self, generation: u64, finished: bool) -> Option<SettledSeek> {
        match &self.pending {
            Some(pending) if pending.generation == generation => {}
            _ => return None,
        }

        self.pending.take().map(|pending| SettledSeek {
            target: pending.target,
            finished,
            after: pending.after,
            notifier: pending.notifier,
        })
    }

    /// Drop the pending seek (its completion resolves `false`).
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            let _ = pending.notifier.send(false);
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
