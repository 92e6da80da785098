//! # Playback Controller
//!
//! The controller is a single tokio task that exclusively owns the engine
//! handle, the attached item, the [`Status`], the clock and the seek
//! coordinator. Everything that can change that state arrives as a typed
//! message on one unbounded mailbox:
//!
//! - requests from [`PlaybackController`] handles,
//! - engine signals and interruption events, pumped in by forwarder tasks,
//! - load results and seek completions, reported by spawned tasks and tagged
//!   with the generation that issued them.
//!
//! Handles never touch state directly. They enqueue a request and return;
//! reads go through a `watch` snapshot that the task publishes before it
//! broadcasts the matching notification.
//!
//! ## Usage
//!
//! ```ignore
//! use core_playback::{PlaybackConfiguration, PlaybackController};
//! use bridge_traits::MediaSource;
//!
//! let controller = PlaybackController::spawn(config)?;
//! controller.prepare_to_play(
//!     MediaSource::audio_stream("https://cdn.example.com/episode.mp3"),
//!     PlaybackConfiguration::autoplay(),
//! )?;
//!
//! let mut events = controller.subscribe();
//! while let Ok(event) = events.recv().await {
//!     println!("{}", event.notification.description());
//! }
//! ```

use crate::clock::PlaybackClock;
use crate::commands::{self, CommandAction, CommandStatus, RemoteCommand};
use crate::config::PlaybackConfiguration;
use crate::error::{PlaybackError, Result};
use crate::events::{ControllerEvent, ControllerId, EventBus, EventStream, PlaybackNotification};
use crate::interruption::{self, InterruptionAction};
use crate::seek::{AfterSeek, SeekCompletion, SeekCoordinator, SettledSeek};
use crate::status::{PlaybackSnapshot, Status};
use crate::transition::{self, Reaction, Trigger};
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    AudioSession, EngineSignal, EngineSignalStream, InterruptionEvent, InterruptionStream,
    ItemId, ItemStatus, MediaLocator, MediaSource, PlaybackEngine, RemoteCommandCenter,
    RemoteCommandRegistration,
};
use core_runtime::config::CoreConfig;
use core_runtime::logging::{redact_url, strip_path};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

// ============================================================================
// Messages
// ============================================================================

enum Message {
    Request(Request),
    Engine(EngineSignal),
    Interruption(InterruptionEvent),
    LoadFinished {
        generation: u64,
        result: BridgeResult<ItemId>,
    },
    SeekFinished {
        generation: u64,
        finished: bool,
    },
    Shutdown {
        ack: oneshot::Sender<()>,
    },
}

enum Request {
    PrepareToPlay {
        source: MediaSource,
        configuration: PlaybackConfiguration,
    },
    Play,
    Pause {
        manually: bool,
    },
    TogglePlayPause,
    Stop {
        notifier: oneshot::Sender<bool>,
    },
    SkipForward {
        notifier: oneshot::Sender<bool>,
    },
    SkipBackward {
        notifier: oneshot::Sender<bool>,
    },
    Seek {
        target: Duration,
        accurate: bool,
        notifier: oneshot::Sender<bool>,
    },
    SetSkipIntervals {
        forward: Option<Duration>,
        backward: Option<Duration>,
    },
    RemoteCommand {
        command: RemoteCommand,
        reply: oneshot::Sender<CommandStatus>,
    },
    Settle {
        reply: oneshot::Sender<()>,
    },
}

fn deliver(mailbox: &WeakUnboundedSender<Message>, message: Message) -> bool {
    match mailbox.upgrade() {
        Some(sender) => sender.send(message).is_ok(),
        None => false,
    }
}

fn forward_engine_signals(
    mut signals: Box<dyn EngineSignalStream>,
    mailbox: WeakUnboundedSender<Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(signal) = signals.next().await {
            if !deliver(&mailbox, Message::Engine(signal)) {
                break;
            }
        }
    })
}

fn forward_interruptions(
    mut interruptions: Box<dyn InterruptionStream>,
    mailbox: WeakUnboundedSender<Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = interruptions.next().await {
            if !deliver(&mailbox, Message::Interruption(event)) {
                break;
            }
        }
    })
}

/// Loggable description of a source that never exposes query strings.
fn describe_source(source: &MediaSource) -> String {
    match &source.locator {
        MediaLocator::LocalFile { path } => strip_path(&path.to_string_lossy()).to_string(),
        MediaLocator::RemoteStream { url, .. } => redact_url(url),
    }
}

// ============================================================================
// Handle
// ============================================================================

/// Handle to a running playback controller.
///
/// Cheap to clone. The controller task stops when [`shutdown`](Self::shutdown)
/// is called or every handle has been dropped.
#[derive(Clone)]
pub struct PlaybackController {
    id: ControllerId,
    mailbox: UnboundedSender<Message>,
    state: watch::Receiver<PlaybackSnapshot>,
    events: EventBus,
}

impl PlaybackController {
    /// Spawn a controller task on the current tokio runtime.
    ///
    /// The periodic time interval is installed on the engine and the engine
    /// signal stream is subscribed before this returns.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::Runtime`] outside a tokio runtime
    /// - [`PlaybackError::InvalidConfiguration`] for out-of-range settings
    pub fn spawn(config: CoreConfig) -> Result<Self> {
        config.validate()?;
        tokio::runtime::Handle::try_current()
            .map_err(|e| PlaybackError::Runtime(e.to_string()))?;

        let CoreConfig {
            engine,
            audio_session,
            remote_commands,
            settings,
        } = config;

        let id = ControllerId::new();
        let (mailbox, inbox) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(PlaybackSnapshot::default());
        let events = EventBus::new(settings.event_buffer_size);

        engine.set_periodic_time_interval(settings.periodic_time_interval);

        let mut forwarders = vec![forward_engine_signals(
            engine.signals(),
            mailbox.downgrade(),
        )];
        if let Some(session) = &audio_session {
            forwarders.push(forward_interruptions(
                session.interruptions(),
                mailbox.downgrade(),
            ));
        }

        let task = ControllerTask {
            id,
            engine,
            audio_session,
            remote_commands,
            forward_skip_interval: settings.forward_skip_interval,
            backward_skip_interval: settings.backward_skip_interval,
            mailbox: mailbox.downgrade(),
            state: state_tx,
            events: events.clone(),
            status: Status::Idle,
            clock: PlaybackClock::new(),
            seeks: SeekCoordinator::new(),
            source: None,
            item: None,
            prepare_generation: 0,
            playing_from_beginning: true,
            interrupted: false,
            awaiting_start_seek: false,
            commands_registered: false,
            forwarders,
        };
        tokio::spawn(task.run(inbox));

        Ok(Self {
            id,
            mailbox,
            state: state_rx,
            events,
        })
    }

    /// Spawn a controller around `engine` with default settings.
    pub fn with_engine(engine: Arc<dyn PlaybackEngine>) -> Result<Self> {
        let config = CoreConfig::builder().engine(engine).build()?;
        Self::spawn(config)
    }

    pub fn id(&self) -> ControllerId {
        self.id
    }

    fn send(&self, request: Request) -> Result<()> {
        self.mailbox
            .send(Message::Request(request))
            .map_err(|_| PlaybackError::ControllerClosed)
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    /// Replace the source and start preparing it.
    ///
    /// Load and item failures are reported through the status, not here.
    pub fn prepare_to_play(
        &self,
        source: MediaSource,
        configuration: PlaybackConfiguration,
    ) -> Result<()> {
        self.send(Request::PrepareToPlay {
            source,
            configuration,
        })
    }

    /// Play from `Paused` or `Preparing`; a no-op elsewhere or while
    /// interrupted.
    pub fn play(&self) -> Result<()> {
        self.send(Request::Play)
    }

    pub fn pause(&self, manually: bool) -> Result<()> {
        self.send(Request::Pause { manually })
    }

    pub fn toggle_play_pause(&self) -> Result<()> {
        self.send(Request::TogglePlayPause)
    }

    /// Pause (when playing) and rewind to zero.
    pub fn stop(&self) -> Result<SeekCompletion> {
        let (notifier, completion) = SeekCompletion::channel();
        self.send(Request::Stop { notifier })?;
        Ok(completion)
    }

    pub fn skip_forward(&self) -> Result<SeekCompletion> {
        let (notifier, completion) = SeekCompletion::channel();
        self.send(Request::SkipForward { notifier })?;
        Ok(completion)
    }

    /// Skip backward; saturates at zero.
    pub fn skip_backward(&self) -> Result<SeekCompletion> {
        let (notifier, completion) = SeekCompletion::channel();
        self.send(Request::SkipBackward { notifier })?;
        Ok(completion)
    }

    /// Seek to `time`. `accurate` requests a frame-exact seek.
    ///
    /// The returned completion resolves `true` once the seek lands, or `false`
    /// if a newer seek superseded it first.
    pub fn seek_to_time(&self, time: Duration, accurate: bool) -> Result<SeekCompletion> {
        let (notifier, completion) = SeekCompletion::channel();
        self.send(Request::Seek {
            target: time,
            accurate,
            notifier,
        })?;
        Ok(completion)
    }

    pub fn set_forward_skip_interval(&self, interval: Duration) -> Result<()> {
        validate_skip_interval(interval)?;
        self.send(Request::SetSkipIntervals {
            forward: Some(interval),
            backward: None,
        })
    }

    pub fn set_backward_skip_interval(&self, interval: Duration) -> Result<()> {
        validate_skip_interval(interval)?;
        self.send(Request::SetSkipIntervals {
            forward: None,
            backward: Some(interval),
        })
    }

    /// Route a host remote command.
    ///
    /// Returns [`CommandStatus::Rejected`] once the controller has shut down.
    pub async fn handle_remote_command(&self, command: RemoteCommand) -> CommandStatus {
        let (reply, response) = oneshot::channel();
        if self.send(Request::RemoteCommand { command, reply }).is_err() {
            return CommandStatus::Rejected;
        }
        response.await.unwrap_or(CommandStatus::Rejected)
    }

    // ------------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------------

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> Status {
        self.state.borrow().status.clone()
    }

    pub fn elapsed_time(&self) -> Duration {
        self.state.borrow().elapsed_time
    }

    pub fn duration(&self) -> Option<Duration> {
        self.state.borrow().duration
    }

    pub fn source(&self) -> Option<MediaSource> {
        self.state.borrow().source.clone()
    }

    /// Receiver that observes every settled snapshot.
    pub fn watch(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.state.clone()
    }

    /// Subscribe to notifications emitted from now on.
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Resolves once every message enqueued before this call was processed.
    pub async fn settle(&self) -> Result<()> {
        let (reply, done) = oneshot::channel();
        self.send(Request::Settle { reply })?;
        done.await.map_err(|_| PlaybackError::ControllerClosed)
    }

    /// Stop the controller task, detaching the engine item.
    pub async fn shutdown(&self) {
        let (ack, done) = oneshot::channel();
        if self.mailbox.send(Message::Shutdown { ack }).is_ok() {
            let _ = done.await;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.mailbox.is_closed()
    }
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("id", &self.id)
            .field("status", &self.state.borrow().status)
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn validate_skip_interval(interval: Duration) -> Result<()> {
    if interval.is_zero() {
        return Err(PlaybackError::InvalidConfiguration(
            "Skip interval must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

// ============================================================================
// Controller Task
// ============================================================================

struct ControllerTask {
    id: ControllerId,
    engine: Arc<dyn PlaybackEngine>,
    audio_session: Option<Arc<dyn AudioSession>>,
    remote_commands: Option<Arc<dyn RemoteCommandCenter>>,
    forward_skip_interval: Duration,
    backward_skip_interval: Duration,
    mailbox: WeakUnboundedSender<Message>,
    state: watch::Sender<PlaybackSnapshot>,
    events: EventBus,

    status: Status,
    clock: PlaybackClock,
    seeks: SeekCoordinator,
    source: Option<MediaSource>,
    item: Option<ItemId>,
    prepare_generation: u64,
    playing_from_beginning: bool,
    interrupted: bool,
    /// An item-ready start seek is in flight; the next current-generation
    /// seek completion resolves the preparation.
    awaiting_start_seek: bool,
    commands_registered: bool,
    forwarders: Vec<JoinHandle<()>>,
}

impl ControllerTask {
    async fn run(mut self, mut inbox: UnboundedReceiver<Message>) {
        info!(controller = %self.id, "Playback controller started");

        if let Some(session) = &self.audio_session {
            if let Err(error) = session.activate_playback_category().await {
                warn!(controller = %self.id, error = %error, "Failed to activate audio session");
            }
        }

        let mut ack = None;
        while let Some(message) = inbox.recv().await {
            if let ControlFlow::Break(sender) = self.handle(message).await {
                inbox.close();
                ack = Some(sender);
                break;
            }
        }

        self.teardown().await;
        if let Some(ack) = ack {
            let _ = ack.send(());
        }
    }

    async fn handle(&mut self, message: Message) -> ControlFlow<oneshot::Sender<()>> {
        match message {
            Message::Request(request) => self.handle_request(request).await,
            Message::Engine(signal) => self.handle_signal(signal).await,
            Message::Interruption(event) => self.handle_interruption(event).await,
            Message::LoadFinished { generation, result } => {
                self.finish_load(generation, result).await
            }
            Message::SeekFinished {
                generation,
                finished,
            } => self.finish_seek(generation, finished).await,
            Message::Shutdown { ack } => return ControlFlow::Break(ack),
        }
        ControlFlow::Continue(())
    }

    async fn handle_request(&mut self, request: Request) {
        match request {
            Request::PrepareToPlay {
                source,
                configuration,
            } => self.prepare_to_play(source, configuration).await,
            Request::Play => self.play().await,
            Request::Pause { manually } => self.pause(manually).await,
            Request::TogglePlayPause => self.toggle_play_pause().await,
            Request::Stop { notifier } => self.stop(notifier, false).await,
            Request::SkipForward { notifier } => self.skip_forward(notifier).await,
            Request::SkipBackward { notifier } => self.skip_backward(notifier).await,
            Request::Seek {
                target,
                accurate,
                notifier,
            } => self.seek(target, accurate, AfterSeek::Nothing, notifier).await,
            Request::SetSkipIntervals { forward, backward } => {
                self.set_skip_intervals(forward, backward)
            }
            Request::RemoteCommand { command, reply } => {
                let status = self.handle_remote_command(command).await;
                let _ = reply.send(status);
            }
            Request::Settle { reply } => {
                let _ = reply.send(());
            }
        }
    }

    async fn teardown(&mut self) {
        self.seeks.cancel();
        for forwarder in self.forwarders.drain(..) {
            forwarder.abort();
        }

        if self.item.take().is_some() {
            if let Err(error) = self.engine.pause().await {
                warn!(controller = %self.id, error = %error, "Engine pause failed during shutdown");
            }
            if let Err(error) = self.engine.replace_current_item(None).await {
                warn!(controller = %self.id, error = %error, "Failed to detach item during shutdown");
            }
        }

        if self.commands_registered {
            self.unregister_remote_commands();
        }

        info!(controller = %self.id, "Playback controller stopped");
    }

    // ------------------------------------------------------------------------
    // Published state
    // ------------------------------------------------------------------------

    fn emit(&self, notification: PlaybackNotification) {
        trace!(controller = %self.id, event = notification.description(), "Emitting");
        // No subscribers is not an error.
        let _ = self.events.emit(ControllerEvent::new(self.id, notification));
    }

    fn set_status(&mut self, status: Status) {
        if self.status == status {
            return;
        }

        debug!(
            controller = %self.id,
            from = %self.status,
            to = %status,
            "Status updated"
        );
        self.status = status.clone();
        self.state
            .send_modify(|snapshot| snapshot.status = status.clone());
        self.emit(PlaybackNotification::DidUpdateStatus { status });
    }

    fn set_elapsed(&mut self, elapsed: Duration) {
        if self.clock.set_elapsed(elapsed) {
            self.publish_elapsed(elapsed);
        }
    }

    fn publish_elapsed(&self, elapsed: Duration) {
        self.state
            .send_modify(|snapshot| snapshot.elapsed_time = elapsed);
        self.emit(PlaybackNotification::DidUpdateElapsedTime { elapsed });
    }

    fn publish_duration(&self, duration: Option<Duration>) {
        debug!(controller = %self.id, duration = ?duration, "Duration updated");
        self.state.send_modify(|snapshot| snapshot.duration = duration);
        self.emit(PlaybackNotification::DidUpdateDuration { duration });
    }

    fn is_current(&self, item: ItemId) -> bool {
        self.item == Some(item)
    }

    // ------------------------------------------------------------------------
    // Source preparation
    // ------------------------------------------------------------------------

    async fn prepare_to_play(&mut self, source: MediaSource, configuration: PlaybackConfiguration) {
        info!(
            controller = %self.id,
            source = %describe_source(&source),
            kind = ?source.kind,
            play_when_ready = configuration.play_when_ready,
            start_time = ?configuration.start_time,
            "Preparing source"
        );

        if self.status.is_playing() && !configuration.play_when_ready {
            self.pause(true).await;
        }

        self.emit(PlaybackNotification::WillChangeSource);
        self.source = Some(source.clone());
        self.state
            .send_modify(|snapshot| snapshot.source = Some(source.clone()));
        self.emit(PlaybackNotification::DidChangeSource);

        // Anything still in flight belongs to the old item.
        self.seeks.cancel();
        self.awaiting_start_seek = false;
        if self.item.take().is_some() {
            debug!(controller = %self.id, "Detaching previous item");
        }
        if let Err(error) = self.engine.replace_current_item(None).await {
            warn!(controller = %self.id, error = %error, "Failed to detach engine item");
        }

        self.set_status(Status::Preparing {
            play_when_ready: configuration.play_when_ready,
            start_time: configuration.start_time,
        });
        self.engine.set_automatically_waits_to_minimize_stalling(
            configuration.automatically_waits_to_minimize_stalling,
        );

        self.prepare_generation += 1;
        let generation = self.prepare_generation;
        let engine = Arc::clone(&self.engine);
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            let result = engine.load(&source).await;
            deliver(&mailbox, Message::LoadFinished { generation, result });
        });
    }

    async fn finish_load(&mut self, generation: u64, result: BridgeResult<ItemId>) {
        if generation != self.prepare_generation {
            debug!(
                controller = %self.id,
                generation = generation,
                current = self.prepare_generation,
                "Discarding stale load result"
            );
            return;
        }

        let item = match result {
            Ok(item) => item,
            Err(error) => {
                warn!(controller = %self.id, error = %error, "Source load failed");
                self.set_status(Status::Error {
                    cause: Some(PlaybackError::LoadFailed(error.to_string())),
                });
                return;
            }
        };

        if let Err(error) = self.engine.replace_current_item(Some(item)).await {
            warn!(controller = %self.id, error = %error, "Failed to attach item");
            self.set_status(Status::Error {
                cause: Some(PlaybackError::LoadFailed(error.to_string())),
            });
            return;
        }

        self.item = Some(item);
        debug!(controller = %self.id, item = %item, "Item attached");
        self.register_remote_commands();
    }

    // ------------------------------------------------------------------------
    // Remote command center
    // ------------------------------------------------------------------------

    /// Audio items get the full command set; video items get none.
    fn register_remote_commands(&mut self) {
        let is_audio = self.source.as_ref().is_some_and(MediaSource::is_audio);
        if !is_audio {
            self.unregister_remote_commands();
            return;
        }

        let Some(center) = self.remote_commands.clone() else {
            return;
        };

        let registration =
            RemoteCommandRegistration::all(self.forward_skip_interval, self.backward_skip_interval);
        match center.register(&registration) {
            Ok(()) => {
                debug!(controller = %self.id, "Registered remote commands");
                self.commands_registered = true;
            }
            Err(error) => {
                warn!(controller = %self.id, error = %error, "Failed to register remote commands");
            }
        }
    }

    fn unregister_remote_commands(&mut self) {
        let Some(center) = self.remote_commands.clone() else {
            return;
        };

        if let Err(error) = center.unregister() {
            warn!(controller = %self.id, error = %error, "Failed to unregister remote commands");
        }
        self.commands_registered = false;
    }

    fn set_skip_intervals(&mut self, forward: Option<Duration>, backward: Option<Duration>) {
        if let Some(forward) = forward {
            self.forward_skip_interval = forward;
        }
        if let Some(backward) = backward {
            self.backward_skip_interval = backward;
        }

        debug!(
            controller = %self.id,
            forward = ?self.forward_skip_interval,
            backward = ?self.backward_skip_interval,
            "Skip intervals updated"
        );

        if let Some(center) = &self.remote_commands {
            if let Err(error) = center
                .set_preferred_skip_intervals(self.forward_skip_interval, self.backward_skip_interval)
            {
                warn!(controller = %self.id, error = %error, "Failed to update preferred skip intervals");
            }
        }
    }

    async fn handle_remote_command(&mut self, command: RemoteCommand) -> CommandStatus {
        let Some(action) = commands::route(&self.status, command) else {
            debug!(
                controller = %self.id,
                command = ?command,
                status = %self.status,
                "Remote command has no actionable item"
            );
            return CommandStatus::NoActionableItem;
        };

        debug!(controller = %self.id, command = ?command, action = ?action, "Remote command");
        match action {
            CommandAction::Acknowledge => {}
            CommandAction::Play => self.play().await,
            CommandAction::PauseManually => self.pause(true).await,
            CommandAction::MarkManuallyPaused => self.set_status(Status::Paused { manually: true }),
            CommandAction::SkipForward => self.skip_forward(detached_notifier()).await,
            CommandAction::SkipBackward => self.skip_backward(detached_notifier()).await,
            CommandAction::Seek(position) => {
                self.seek(position, true, AfterSeek::Nothing, detached_notifier())
                    .await
            }
        }
        CommandStatus::Success
    }

    // ------------------------------------------------------------------------
    // Playback operations
    // ------------------------------------------------------------------------

    async fn play(&mut self) {
        if self.interrupted {
            debug!(controller = %self.id, "Ignoring play while interrupted");
            return;
        }

        match self.status {
            Status::Paused { .. } | Status::Preparing { .. } => {
                if let Err(error) = self.engine.play().await {
                    warn!(controller = %self.id, error = %error, "Engine play failed");
                }

                self.set_status(Status::Playing {
                    from_beginning: self.playing_from_beginning,
                });

                if self.playing_from_beginning {
                    self.playing_from_beginning = false;
                    self.emit(PlaybackNotification::DidBeginPlayback);
                } else {
                    self.emit(PlaybackNotification::DidResumePlayback);
                }
            }
            Status::Idle | Status::Playing { .. } | Status::Buffering | Status::Error { .. } => {}
        }
    }

    async fn pause(&mut self, manually: bool) {
        match self.status {
            Status::Preparing {
                play_when_ready: true,
                start_time,
            } => self.set_status(Status::Preparing {
                play_when_ready: false,
                start_time,
            }),
            Status::Playing { .. } | Status::Buffering => {
                if let Err(error) = self.engine.pause().await {
                    warn!(controller = %self.id, error = %error, "Engine pause failed");
                }
                self.set_status(Status::Paused { manually });
                self.emit(PlaybackNotification::DidPausePlayback);
            }
            Status::Preparing { .. } | Status::Idle | Status::Paused { .. } | Status::Error { .. } => {}
        }
    }

    async fn toggle_play_pause(&mut self) {
        match self.status {
            Status::Playing { .. } => self.pause(true).await,
            Status::Paused { .. } => self.play().await,
            Status::Idle | Status::Buffering | Status::Preparing { .. } | Status::Error { .. } => {}
        }
    }

    async fn stop(&mut self, notifier: oneshot::Sender<bool>, played_to_end: bool) {
        let announce = matches!(self.status, Status::Playing { .. } | Status::Buffering);
        if announce {
            self.pause(true).await;
        }

        self.playing_from_beginning = true;
        self.seek(
            Duration::ZERO,
            true,
            AfterSeek::FinishStop {
                announce,
                played_to_end,
            },
            notifier,
        )
        .await;
    }

    async fn skip_forward(&mut self, notifier: oneshot::Sender<bool>) {
        let target = self.clock.elapsed().saturating_add(self.forward_skip_interval);
        self.seek(target, true, AfterSeek::Nothing, notifier).await;
    }

    async fn skip_backward(&mut self, notifier: oneshot::Sender<bool>) {
        let target = self.clock.elapsed().saturating_sub(self.backward_skip_interval);
        self.seek(target, true, AfterSeek::Nothing, notifier).await;
    }

    // ------------------------------------------------------------------------
    // Seeking
    // ------------------------------------------------------------------------

    async fn seek(
        &mut self,
        target: Duration,
        accurate: bool,
        after: AfterSeek,
        notifier: oneshot::Sender<bool>,
    ) {
        let target = self.clock.clamp(target);
        let ticket = self.seeks.begin(target, accurate, after, notifier);

        let Some(item) = self.item else {
            debug!(controller = %self.id, target = ?target, "Seek without an attached item");
            if let Some(settled) = self.seeks.complete(ticket.generation, true) {
                self.settle_seek(settled, false).await;
            }
            return;
        };

        debug!(
            controller = %self.id,
            generation = ticket.generation,
            target = ?target,
            accurate = accurate,
            "Seeking"
        );
        self.emit(PlaybackNotification::WillChangePosition);

        let engine = Arc::clone(&self.engine);
        let mailbox = self.mailbox.clone();
        let id = self.id;
        tokio::spawn(async move {
            let finished = match engine.seek(item, ticket.target, ticket.tolerance).await {
                Ok(finished) => finished,
                Err(error) => {
                    warn!(controller = %id, error = %error, "Engine seek failed");
                    false
                }
            };
            deliver(
                &mailbox,
                Message::SeekFinished {
                    generation: ticket.generation,
                    finished,
                },
            );
        });
    }

    async fn finish_seek(&mut self, generation: u64, finished: bool) {
        match self.seeks.complete(generation, finished) {
            Some(settled) => self.settle_seek(settled, true).await,
            None => {
                debug!(
                    controller = %self.id,
                    generation = generation,
                    current = self.seeks.generation(),
                    "Discarding superseded seek result"
                );
            }
        }
    }

    /// Order: elapsed time, continuation, `DidChangePosition`, caller
    /// completion, pending preparation.
    async fn settle_seek(&mut self, settled: SettledSeek, attached: bool) {
        if settled.finished {
            if attached {
                // The duration may have been revised while the seek was out.
                self.set_elapsed(self.clock.clamp(settled.target));
            }
            self.run_after_seek(settled.after);
            if attached {
                self.emit(PlaybackNotification::DidChangePosition);
            }
        } else {
            debug!(controller = %self.id, target = ?settled.target, "Engine cancelled seek");
        }
        settled.resolve();

        if self.awaiting_start_seek {
            self.awaiting_start_seek = false;
            self.resolve_preparation().await;
        }
    }

    fn run_after_seek(&mut self, after: AfterSeek) {
        match after {
            AfterSeek::Nothing => {}
            AfterSeek::FinishStop {
                announce,
                played_to_end,
            } => {
                self.set_elapsed(Duration::ZERO);
                if announce {
                    self.emit(PlaybackNotification::DidStopPlayback);
                }
                if played_to_end {
                    self.emit(PlaybackNotification::DidPlayToEnd);
                }
            }
        }
    }

    async fn resolve_preparation(&mut self) {
        match transition::resolve_preparation(&self.status) {
            Reaction::Play => self.play().await,
            Reaction::Become(status) => self.set_status(status),
            Reaction::Stay | Reaction::SeekToStart(_) => {}
        }
    }

    // ------------------------------------------------------------------------
    // Engine signals
    // ------------------------------------------------------------------------

    async fn handle_signal(&mut self, signal: EngineSignal) {
        let trigger = match signal {
            EngineSignal::Rate(rate) => Trigger::RateChanged { rate },
            EngineSignal::TimeControl(status) => Trigger::TimeControlChanged(status),
            EngineSignal::ItemStatus { item, status } => {
                if !self.is_current(item) {
                    trace!(controller = %self.id, item = %item, "Ignoring status of non-current item");
                    return;
                }
                match status {
                    ItemStatus::ReadyToPlay => Trigger::ItemReadyToPlay,
                    ItemStatus::Failed { message } => {
                        warn!(controller = %self.id, error = %message, "Item failed");
                        Trigger::ItemFailed(message)
                    }
                    ItemStatus::Unknown => {
                        warn!(controller = %self.id, "Item status unknown");
                        Trigger::ItemUnknown
                    }
                }
            }
            EngineSignal::ItemDuration { item, seconds } => {
                if self.is_current(item) {
                    if let Some(duration) = self.clock.duration_reading(seconds) {
                        self.publish_duration(duration);
                    }
                }
                return;
            }
            EngineSignal::Position { item, seconds } => {
                if self.is_current(item) {
                    if let Some(elapsed) = self.clock.position_tick(seconds) {
                        self.publish_elapsed(elapsed);
                    }
                }
                return;
            }
            EngineSignal::PlayedToEnd { item } => {
                if self.is_current(item) {
                    info!(controller = %self.id, "Item played to end");
                    self.stop(detached_notifier(), true).await;
                }
                return;
            }
        };

        let reaction = transition::reconcile(&self.status, &trigger, self.playing_from_beginning);
        trace!(controller = %self.id, trigger = ?trigger, reaction = ?reaction, "Reconciled");

        match reaction {
            Reaction::Stay => {}
            Reaction::Become(status) => self.set_status(status),
            Reaction::Play => self.play().await,
            Reaction::SeekToStart(start_time) => {
                self.awaiting_start_seek = true;
                self.seek(start_time, true, AfterSeek::Nothing, detached_notifier())
                    .await;
            }
        }
    }

    // ------------------------------------------------------------------------
    // Interruptions
    // ------------------------------------------------------------------------

    /// Interruptions only apply to an attached audio item.
    fn observes_interruptions(&self) -> bool {
        self.item.is_some() && self.source.as_ref().is_some_and(MediaSource::is_audio)
    }

    async fn handle_interruption(&mut self, event: InterruptionEvent) {
        match event {
            InterruptionEvent::Began => {
                if !self.observes_interruptions() {
                    debug!(controller = %self.id, "Ignoring interruption without an audio item");
                    return;
                }
                info!(controller = %self.id, status = %self.status, "Audio interruption began");
                self.interrupted = true;
            }
            InterruptionEvent::Ended { should_resume } => {
                // Cleared first so a resulting play() goes through.
                self.interrupted = false;
                if !self.observes_interruptions() {
                    return;
                }

                let action = interruption::on_interruption_ended(&self.status, should_resume);
                info!(
                    controller = %self.id,
                    status = %self.status,
                    should_resume = ?should_resume,
                    action = ?action,
                    "Audio interruption ended"
                );

                match action {
                    InterruptionAction::None => {}
                    InterruptionAction::Resume => self.play().await,
                    InterruptionAction::Resync => {
                        if let Err(error) = self.engine.play().await {
                            warn!(controller = %self.id, error = %error, "Engine play failed");
                        }
                    }
                    InterruptionAction::Pause => self.pause(false).await,
                    InterruptionAction::Prepare {
                        play_when_ready,
                        start_time,
                    } => self.set_status(Status::Preparing {
                        play_when_ready,
                        start_time,
                    }),
                }
            }
        }
    }
}

/// Notifier for internally issued seeks nobody awaits.
fn detached_notifier() -> oneshot::Sender<bool> {
    SeekCompletion::channel().0
}
