//! Scripted host bridges shared by the controller integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::{
    AudioSession, EngineSignal, EngineSignalStream, InterruptionEvent, InterruptionStream, ItemId,
    ItemStatus, MediaSource, PlaybackEngine, SeekTolerance, TimeControlStatus,
};
use core_playback::{
    ControllerEvent, EventStream, PlaybackController, PlaybackNotification, PlaybackSnapshot,
    Status,
};
use core_runtime::config::CoreConfig;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

pub const TIMEOUT: Duration = Duration::from_secs(2);

// ============================================================================
// Scripted Engine
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Load(MediaSource),
    Replace(Option<ItemId>),
    Play,
    Pause,
    Seek(Duration, SeekTolerance),
}

struct HeldSeek {
    position: Duration,
    reply: oneshot::Sender<bool>,
}

#[derive(Default)]
struct EngineState {
    subscribers: Vec<mpsc::UnboundedSender<EngineSignal>>,
    calls: Vec<EngineCall>,
    current_item: Option<ItemId>,
    load_failure: Option<String>,
    hold_loads: bool,
    held_loads: Vec<oneshot::Sender<()>>,
    hold_seeks: bool,
    held_seeks: Vec<Option<HeldSeek>>,
    auto_ready: bool,
    duration_seconds: Option<f64>,
    periodic_interval: Option<Duration>,
    automatically_waits: Option<bool>,
    signals_sent: usize,
    signals_requested: usize,
}

/// Engine double whose behaviour is scripted by the test.
///
/// `play()`/`pause()` echo realistic rate and time-control signals back, the
/// way a real engine would.
#[derive(Clone, Default)]
pub struct ScriptedEngine {
    state: Arc<Mutex<EngineState>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report the item ready (and its duration) as soon as it is attached.
    pub fn auto_ready(self) -> Self {
        self.state.lock().unwrap().auto_ready = true;
        self
    }

    pub fn with_duration(self, seconds: f64) -> Self {
        self.state.lock().unwrap().duration_seconds = Some(seconds);
        self
    }

    pub fn with_load_failure(self, message: &str) -> Self {
        self.state.lock().unwrap().load_failure = Some(message.to_string());
        self
    }

    /// Keep `load()` pending until [`release_load`](Self::release_load).
    pub fn holding_loads(self) -> Self {
        self.state.lock().unwrap().hold_loads = true;
        self
    }

    /// Keep `seek()` pending until [`complete_seek`](Self::complete_seek).
    pub fn holding_seeks(self) -> Self {
        self.state.lock().unwrap().hold_seeks = true;
        self
    }

    pub fn emit(&self, signal: EngineSignal) {
        let mut state = self.state.lock().unwrap();
        state
            .subscribers
            .retain(|subscriber| subscriber.send(signal.clone()).is_ok());
        if !state.subscribers.is_empty() {
            state.signals_sent += 1;
        }
    }

    /// Every emitted signal has been handed to the controller's mailbox.
    ///
    /// The forwarder only asks for the next signal after delivering the
    /// previous one.
    pub fn drained(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.signals_requested > state.signals_sent
    }

    pub fn live_subscribers(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .subscribers
            .iter()
            .filter(|subscriber| !subscriber.is_closed())
            .count()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, matcher: impl Fn(&EngineCall) -> bool) -> usize {
        self.calls().iter().filter(|call| matcher(call)).count()
    }

    pub fn current_item(&self) -> Option<ItemId> {
        self.state.lock().unwrap().current_item
    }

    pub fn periodic_interval(&self) -> Option<Duration> {
        self.state.lock().unwrap().periodic_interval
    }

    pub fn automatically_waits(&self) -> Option<bool> {
        self.state.lock().unwrap().automatically_waits
    }

    pub fn held_load_count(&self) -> usize {
        self.state.lock().unwrap().held_loads.len()
    }

    pub fn release_load(&self, index: usize) {
        let sender = {
            let mut state = self.state.lock().unwrap();
            let (gate, _) = oneshot::channel();
            std::mem::replace(&mut state.held_loads[index], gate)
        };
        let _ = sender.send(());
    }

    pub fn held_seek_count(&self) -> usize {
        self.state.lock().unwrap().held_seeks.len()
    }

    pub fn held_seek_position(&self, index: usize) -> Option<Duration> {
        self.state.lock().unwrap().held_seeks[index]
            .as_ref()
            .map(|seek| seek.position)
    }

    pub fn complete_seek(&self, index: usize, finished: bool) {
        let held = self.state.lock().unwrap().held_seeks[index].take();
        if let Some(seek) = held {
            let _ = seek.reply.send(finished);
        }
    }

    /// Report the attached item ready.
    pub fn make_ready(&self) {
        let item = self.current_item().expect("no item attached");
        self.emit(EngineSignal::ItemStatus {
            item,
            status: ItemStatus::ReadyToPlay,
        });
    }

    pub fn tick(&self, seconds: f64) {
        let item = self.current_item().expect("no item attached");
        self.emit(EngineSignal::Position { item, seconds });
    }
}

struct ScriptedSignals {
    receiver: mpsc::UnboundedReceiver<EngineSignal>,
    state: Arc<Mutex<EngineState>>,
}

#[async_trait]
impl EngineSignalStream for ScriptedSignals {
    async fn next(&mut self) -> Option<EngineSignal> {
        self.state.lock().unwrap().signals_requested += 1;
        self.receiver.recv().await
    }
}

#[async_trait]
impl PlaybackEngine for ScriptedEngine {
    async fn load(&self, source: &MediaSource) -> BridgeResult<ItemId> {
        let gate = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(EngineCall::Load(source.clone()));
            if state.hold_loads {
                let (sender, receiver) = oneshot::channel();
                state.held_loads.push(sender);
                Some(receiver)
            } else {
                None
            }
        };

        if let Some(gate) = gate {
            let _ = gate.await;
        }

        match self.state.lock().unwrap().load_failure.clone() {
            Some(message) => Err(BridgeError::SourceUnavailable(message)),
            None => Ok(ItemId::new()),
        }
    }

    async fn replace_current_item(&self, item: Option<ItemId>) -> BridgeResult<()> {
        let (auto_ready, duration) = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(EngineCall::Replace(item));
            state.current_item = item;
            (state.auto_ready, state.duration_seconds)
        };

        if let (Some(item), true) = (item, auto_ready) {
            if let Some(seconds) = duration {
                self.emit(EngineSignal::ItemDuration { item, seconds });
            }
            self.emit(EngineSignal::ItemStatus {
                item,
                status: ItemStatus::ReadyToPlay,
            });
        }
        Ok(())
    }

    async fn play(&self) -> BridgeResult<()> {
        self.state.lock().unwrap().calls.push(EngineCall::Play);
        self.emit(EngineSignal::Rate(1.0));
        self.emit(EngineSignal::TimeControl(TimeControlStatus::Playing));
        Ok(())
    }

    async fn pause(&self) -> BridgeResult<()> {
        self.state.lock().unwrap().calls.push(EngineCall::Pause);
        self.emit(EngineSignal::Rate(0.0));
        self.emit(EngineSignal::TimeControl(TimeControlStatus::Paused));
        Ok(())
    }

    async fn seek(
        &self,
        _item: ItemId,
        position: Duration,
        tolerance: SeekTolerance,
    ) -> BridgeResult<bool> {
        let held = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(EngineCall::Seek(position, tolerance));
            if state.hold_seeks {
                let (reply, receiver) = oneshot::channel();
                state.held_seeks.push(Some(HeldSeek { position, reply }));
                Some(receiver)
            } else {
                None
            }
        };

        match held {
            Some(receiver) => Ok(receiver.await.unwrap_or(false)),
            None => Ok(true),
        }
    }

    fn set_periodic_time_interval(&self, interval: Duration) {
        self.state.lock().unwrap().periodic_interval = Some(interval);
    }

    fn set_automatically_waits_to_minimize_stalling(&self, enabled: bool) {
        self.state.lock().unwrap().automatically_waits = Some(enabled);
    }

    fn signals(&self) -> Box<dyn EngineSignalStream> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.state.lock().unwrap().subscribers.push(sender);
        Box::new(ScriptedSignals {
            receiver,
            state: Arc::clone(&self.state),
        })
    }
}

// ============================================================================
// Scripted Audio Session
// ============================================================================

#[derive(Default)]
struct SessionState {
    subscribers: Vec<mpsc::UnboundedSender<InterruptionEvent>>,
    sent: usize,
    requested: usize,
}

#[derive(Clone, Default)]
pub struct ScriptedSession {
    state: Arc<Mutex<SessionState>>,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interrupt(&self, event: InterruptionEvent) {
        let mut state = self.state.lock().unwrap();
        state
            .subscribers
            .retain(|subscriber| subscriber.send(event).is_ok());
        if !state.subscribers.is_empty() {
            state.sent += 1;
        }
    }

    pub fn drained(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.requested > state.sent
    }
}

struct ScriptedInterruptions {
    receiver: mpsc::UnboundedReceiver<InterruptionEvent>,
    state: Arc<Mutex<SessionState>>,
}

#[async_trait]
impl InterruptionStream for ScriptedInterruptions {
    async fn next(&mut self) -> Option<InterruptionEvent> {
        self.state.lock().unwrap().requested += 1;
        self.receiver.recv().await
    }
}

#[async_trait]
impl AudioSession for ScriptedSession {
    async fn activate_playback_category(&self) -> BridgeResult<()> {
        Ok(())
    }

    fn interruptions(&self) -> Box<dyn InterruptionStream> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.state.lock().unwrap().subscribers.push(sender);
        Box::new(ScriptedInterruptions {
            receiver,
            state: Arc::clone(&self.state),
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Route controller logs through the test harness; `RUST_LOG` filters them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn spawn_controller(engine: &ScriptedEngine) -> PlaybackController {
    init_tracing();
    let config = CoreConfig::builder()
        .engine(Arc::new(engine.clone()))
        .build()
        .unwrap();
    PlaybackController::spawn(config).unwrap()
}

pub fn spawn_with_session(engine: &ScriptedEngine, session: &ScriptedSession) -> PlaybackController {
    init_tracing();
    let config = CoreConfig::builder()
        .engine(Arc::new(engine.clone()))
        .audio_session(Arc::new(session.clone()))
        .build()
        .unwrap();
    PlaybackController::spawn(config).unwrap()
}

pub fn track() -> MediaSource {
    MediaSource::audio_stream("https://cdn.example.com/episode.mp3?token=secret")
}

pub fn clip() -> MediaSource {
    MediaSource::video_file("/videos/clip.mp4")
}

/// Wait until the settled snapshot satisfies `predicate`.
pub async fn wait_for(
    controller: &PlaybackController,
    predicate: impl FnMut(&PlaybackSnapshot) -> bool,
) -> PlaybackSnapshot {
    let mut watch = controller.watch();
    let snapshot = tokio::time::timeout(TIMEOUT, watch.wait_for(predicate))
        .await
        .expect("timed out waiting for snapshot")
        .expect("controller dropped its state")
        .clone();
    snapshot
}

pub async fn wait_for_status(controller: &PlaybackController, status: Status) {
    let expected = status.clone();
    wait_for(controller, move |snapshot| snapshot.status == expected).await;
}

/// Poll a condition on the test doubles.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(TIMEOUT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Wait until every engine signal emitted so far has been processed.
pub async fn flush(controller: &PlaybackController, engine: &ScriptedEngine) {
    eventually(|| engine.drained()).await;
    controller.settle().await.unwrap();
}

/// Wait until every interruption so far has been processed.
pub async fn flush_interruptions(controller: &PlaybackController, session: &ScriptedSession) {
    eventually(|| session.drained()).await;
    controller.settle().await.unwrap();
}

/// Prepare `source`, wait for the item to attach, and let the controller
/// reach a settled status.
pub async fn attach(
    controller: &PlaybackController,
    engine: &ScriptedEngine,
    source: MediaSource,
    configuration: core_playback::PlaybackConfiguration,
) -> ItemId {
    controller.prepare_to_play(source, configuration).unwrap();
    eventually(|| engine.current_item().is_some()).await;
    flush(controller, engine).await;
    engine.current_item().unwrap()
}

/// Prepare a track with autoplay and wait until it is playing.
pub async fn start_playing(controller: &PlaybackController, engine: &ScriptedEngine) -> ItemId {
    controller
        .prepare_to_play(track(), core_playback::PlaybackConfiguration::autoplay())
        .unwrap();
    wait_for(controller, |snapshot| snapshot.status.is_playing()).await;
    flush(controller, engine).await;
    engine.current_item().unwrap()
}

/// Everything currently buffered on the stream.
pub fn drain(stream: &mut EventStream) -> Vec<PlaybackNotification> {
    let mut received = Vec::new();
    while let Some(Ok(ControllerEvent { notification, .. })) = stream.try_recv() {
        received.push(notification);
    }
    received
}

pub fn position_of(events: &[PlaybackNotification], wanted: &PlaybackNotification) -> usize {
    events
        .iter()
        .position(|event| event == wanted)
        .unwrap_or_else(|| panic!("{:?} not found in {:?}", wanted, events))
}
