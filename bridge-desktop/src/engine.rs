//! Virtual Playback Engine
//!
//! A timer-driven engine for hosts without a native media stack. It does not
//! decode anything: each loaded item is an entry from a catalog of known
//! media, and the playback position simply follows the tokio clock while the
//! engine is playing.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    EngineSignal, EngineSignalStream, ItemId, ItemStatus, MediaLocator, MediaSource,
    PlaybackEngine, SeekTolerance, TimeControlStatus,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Catalog entry describing a piece of virtual media.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualMedia {
    duration: Option<Duration>,
    failure: Option<String>,
}

impl VirtualMedia {
    /// Media with a known, finite duration.
    pub fn with_duration(duration: Duration) -> Self {
        Self {
            duration: Some(duration),
            failure: None,
        }
    }

    /// A live stream: the duration is reported as indefinite and the item
    /// never plays to its end.
    pub fn live() -> Self {
        Self {
            duration: None,
            failure: None,
        }
    }

    /// Media that loads fine but reports a failed item status once attached.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self {
            duration: None,
            failure: Some(message.into()),
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }
}

fn catalog_key(source: &MediaSource) -> String {
    match &source.locator {
        MediaLocator::LocalFile { path } => path.to_string_lossy().into_owned(),
        MediaLocator::RemoteStream { url, .. } => url.clone(),
    }
}

/// Where a seek lands: on the preceding whole-second keyframe when the
/// tolerance allows it, otherwise exactly on the target.
fn landing_position(target: Duration, tolerance: SeekTolerance) -> Duration {
    let keyframe = Duration::from_secs(target.as_secs());
    let allowed = tolerance.before.unwrap_or(Duration::MAX);
    if target - keyframe <= allowed {
        keyframe
    } else {
        target
    }
}

struct EngineState {
    catalog: HashMap<String, VirtualMedia>,
    items: HashMap<ItemId, VirtualMedia>,
    current: Option<ItemId>,
    /// Position at `anchor`; advances with the clock while playing.
    position: Duration,
    anchor: Instant,
    playing: bool,
    tick_interval: Duration,
    automatically_waits: bool,
    seek_generation: u64,
    ticker: Option<JoinHandle<()>>,
    subscribers: Vec<mpsc::UnboundedSender<EngineSignal>>,
}

impl EngineState {
    fn new() -> Self {
        Self {
            catalog: HashMap::new(),
            items: HashMap::new(),
            current: None,
            position: Duration::ZERO,
            anchor: Instant::now(),
            playing: false,
            tick_interval: DEFAULT_TICK_INTERVAL,
            automatically_waits: true,
            seek_generation: 0,
            ticker: None,
            subscribers: Vec::new(),
        }
    }

    fn emit(&mut self, signal: EngineSignal) {
        trace!(signal = ?signal, "Engine signal");
        self.subscribers
            .retain(|subscriber| subscriber.send(signal.clone()).is_ok());
    }

    fn current_duration(&self) -> Option<Duration> {
        self.current
            .and_then(|item| self.items.get(&item))
            .and_then(VirtualMedia::duration)
    }

    fn current_position(&self) -> Duration {
        let mut position = self.position;
        if self.playing && self.current.is_some() {
            position += self.anchor.elapsed();
        }
        match self.current_duration() {
            Some(duration) => position.min(duration),
            None => position,
        }
    }

    /// Fold the elapsed play time into `position`.
    fn freeze(&mut self) {
        self.position = self.current_position();
        self.anchor = Instant::now();
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

fn lock(state: &Mutex<EngineState>) -> MutexGuard<'_, EngineState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Periodic position callbacks for the current item.
fn spawn_ticker(engine: Weak<Mutex<EngineState>>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticks = tokio::time::interval(interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticks.tick().await;

        loop {
            ticks.tick().await;

            let Some(shared) = engine.upgrade() else {
                break;
            };
            let mut state = lock(&shared);
            let Some(item) = state.current else {
                break;
            };

            let position = state.current_position();
            state.emit(EngineSignal::Position {
                item,
                seconds: position.as_secs_f64(),
            });

            let ended = state
                .current_duration()
                .is_some_and(|duration| position >= duration);
            if ended {
                info!(item = %item, "Virtual item played to end");
                state.position = position;
                state.anchor = Instant::now();
                state.playing = false;
                state.ticker = None;
                state.emit(EngineSignal::PlayedToEnd { item });
                state.emit(EngineSignal::Rate(0.0));
                state.emit(EngineSignal::TimeControl(TimeControlStatus::Paused));
                break;
            }
        }
    })
}

/// Timer-driven [`PlaybackEngine`] over a catalog of virtual media.
///
/// Cloning yields another handle to the same engine.
#[derive(Clone)]
pub struct VirtualEngine {
    state: Arc<Mutex<EngineState>>,
    load_latency: Duration,
    seek_latency: Duration,
}

impl VirtualEngine {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(EngineState::new())),
            load_latency: Duration::ZERO,
            seek_latency: Duration::ZERO,
        }
    }

    /// Simulated probing time for `load`.
    pub fn with_load_latency(mut self, latency: Duration) -> Self {
        self.load_latency = latency;
        self
    }

    /// Simulated time for a seek to land.
    pub fn with_seek_latency(mut self, latency: Duration) -> Self {
        self.seek_latency = latency;
        self
    }

    /// Make `source` loadable.
    pub fn register(&self, source: &MediaSource, media: VirtualMedia) {
        let key = catalog_key(source);
        debug!(kind = ?source.kind, "Registered virtual media");
        lock(&self.state).catalog.insert(key, media);
    }

    /// Current playback position of the attached item.
    pub fn position(&self) -> Duration {
        lock(&self.state).current_position()
    }

    pub fn is_playing(&self) -> bool {
        lock(&self.state).playing
    }

    pub fn current_item(&self) -> Option<ItemId> {
        lock(&self.state).current
    }

    pub fn automatically_waits_to_minimize_stalling(&self) -> bool {
        lock(&self.state).automatically_waits
    }

    fn start_ticker(&self, state: &mut EngineState) {
        state.stop_ticker();
        state.ticker = Some(spawn_ticker(
            Arc::downgrade(&self.state),
            state.tick_interval,
        ));
    }
}

impl Default for VirtualEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaybackEngine for VirtualEngine {
    async fn load(&self, source: &MediaSource) -> Result<ItemId> {
        if !self.load_latency.is_zero() {
            tokio::time::sleep(self.load_latency).await;
        }

        let mut state = lock(&self.state);
        let media = state
            .catalog
            .get(&catalog_key(source))
            .cloned()
            .ok_or_else(|| {
                BridgeError::SourceUnavailable("media not found in catalog".to_string())
            })?;

        let item = ItemId::new();
        state.items.insert(item, media);
        debug!(item = %item, "Loaded virtual item");
        Ok(item)
    }

    async fn replace_current_item(&self, item: Option<ItemId>) -> Result<()> {
        let mut state = lock(&self.state);

        let media = match item {
            Some(id) => Some(state.items.get(&id).cloned().ok_or_else(|| {
                BridgeError::OperationFailed(format!("Unknown item {}", id))
            })?),
            None => None,
        };

        state.stop_ticker();
        // Seeks in flight belong to the old item.
        state.seek_generation += 1;
        if let Some(previous) = state.current.take() {
            if Some(previous) != item {
                state.items.remove(&previous);
            }
        }
        state.current = item;
        state.position = Duration::ZERO;
        state.anchor = Instant::now();

        let (Some(item), Some(media)) = (item, media) else {
            debug!("Detached current item");
            return Ok(());
        };

        debug!(item = %item, "Attached item");
        state.emit(EngineSignal::ItemDuration {
            item,
            seconds: media
                .duration
                .map_or(f64::INFINITY, |duration| duration.as_secs_f64()),
        });
        let status = match media.failure {
            Some(message) => ItemStatus::Failed { message },
            None => ItemStatus::ReadyToPlay,
        };
        state.emit(EngineSignal::ItemStatus { item, status });

        if state.playing {
            self.start_ticker(&mut state);
        }
        Ok(())
    }

    async fn play(&self) -> Result<()> {
        let mut state = lock(&self.state);
        if state.playing {
            return Ok(());
        }

        state.anchor = Instant::now();
        state.playing = true;
        state.emit(EngineSignal::Rate(1.0));

        if state.current.is_some() {
            state.emit(EngineSignal::TimeControl(TimeControlStatus::Playing));
            self.start_ticker(&mut state);
        } else {
            state.emit(EngineSignal::TimeControl(
                TimeControlStatus::WaitingToPlayAtSpecifiedRate,
            ));
        }
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        let mut state = lock(&self.state);
        if !state.playing {
            return Ok(());
        }

        state.freeze();
        state.playing = false;
        state.stop_ticker();
        state.emit(EngineSignal::Rate(0.0));
        state.emit(EngineSignal::TimeControl(TimeControlStatus::Paused));
        Ok(())
    }

    async fn seek(&self, item: ItemId, position: Duration, tolerance: SeekTolerance) -> Result<bool> {
        let generation = {
            let mut state = lock(&self.state);
            if state.current != Some(item) {
                return Ok(false);
            }
            state.seek_generation += 1;
            state.seek_generation
        };

        if !self.seek_latency.is_zero() {
            tokio::time::sleep(self.seek_latency).await;
        }

        let mut state = lock(&self.state);
        if state.seek_generation != generation || state.current != Some(item) {
            debug!(target = ?position, "Virtual seek interrupted");
            return Ok(false);
        }

        let mut landed = landing_position(position, tolerance);
        if let Some(duration) = state.current_duration() {
            landed = landed.min(duration);
        }
        state.position = landed;
        state.anchor = Instant::now();
        trace!(target = ?position, landed = ?landed, "Virtual seek landed");
        Ok(true)
    }

    fn set_periodic_time_interval(&self, interval: Duration) {
        if interval.is_zero() {
            warn!("Ignoring zero periodic time interval");
            return;
        }
        lock(&self.state).tick_interval = interval;
    }

    fn set_automatically_waits_to_minimize_stalling(&self, enabled: bool) {
        debug!(enabled, "Automatically waits to minimize stalling");
        lock(&self.state).automatically_waits = enabled;
    }

    fn signals(&self) -> Box<dyn EngineSignalStream> {
        let (sender, receiver) = mpsc::unbounded_channel();
        lock(&self.state).subscribers.push(sender);
        Box::new(VirtualSignalStream { receiver })
    }
}

struct VirtualSignalStream {
    receiver: mpsc::UnboundedReceiver<EngineSignal>,
}

#[async_trait]
impl EngineSignalStream for VirtualSignalStream {
    async fn next(&mut self) -> Option<EngineSignal> {
        self.receiver.recv().await
    }
}
