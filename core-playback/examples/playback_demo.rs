//! # Playback Controller Example
//!
//! Drives a playback controller against the desktop virtual engine: prepare
//! with a start time, skip, survive an audio interruption, answer a remote
//! command and stop.
//!
//! Run with: `cargo run --example playback_demo --package core-playback`

use anyhow::Context;
use bridge_desktop::{LocalAudioSession, LoggingRemoteCommandCenter, VirtualEngine, VirtualMedia};
use bridge_traits::{log::LogLevel, MediaSource, PlaybackEngine};
use core_playback::{PlaybackConfiguration, PlaybackController, RemoteCommand, Status};
use core_runtime::config::CoreConfig;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Info),
    )?;

    println!("=== Playback Controller Demo ===\n");

    // ------------------------------------------------------------------------
    // Wiring
    // ------------------------------------------------------------------------
    let episode = MediaSource::audio_stream("https://cdn.example.com/episodes/42.mp3?sig=demo");

    let engine = Arc::new(VirtualEngine::new().with_load_latency(Duration::from_millis(50)));
    engine.register(&episode, VirtualMedia::with_duration(Duration::from_secs(20 * 60)));

    let session = Arc::new(LocalAudioSession::new());
    let center = Arc::new(LoggingRemoteCommandCenter::default());

    let config = CoreConfig::builder()
        .engine(engine.clone())
        .audio_session(session.clone())
        .remote_commands(center.clone())
        .periodic_time_interval(Duration::from_millis(250))
        .build()?;
    let controller = PlaybackController::spawn(config)?;

    let mut events = controller.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            println!("  [event] {}", event.notification.description());
        }
    });

    // ------------------------------------------------------------------------
    // Prepare and play from one minute in
    // ------------------------------------------------------------------------
    println!("1. Preparing episode at 1:00");
    controller.prepare_to_play(
        episode,
        PlaybackConfiguration::autoplay().with_start_time(Duration::from_secs(60)),
    )?;
    wait_until(&controller, |status| matches!(status, Status::Playing { .. })).await?;
    println!("   status: {}, elapsed: {:?}\n", controller.status(), controller.elapsed_time());
    println!("   remote commands: {:?}\n", center.registration().map(|r| r.enabled));

    tokio::time::sleep(Duration::from_secs(1)).await;

    // ------------------------------------------------------------------------
    // Skip
    // ------------------------------------------------------------------------
    println!("2. Skipping forward");
    let finished = controller.skip_forward()?.await;
    println!("   finished: {}, elapsed: {:?}\n", finished, controller.elapsed_time());

    // ------------------------------------------------------------------------
    // Interruption
    // ------------------------------------------------------------------------
    println!("3. Phone call");
    session.begin_interruption();
    // The system silences the engine when it takes the route.
    engine.pause().await?;
    wait_until(&controller, |status| {
        matches!(status, Status::Paused { manually: false })
    })
    .await?;
    println!("   status: {}", controller.status());

    session.end_interruption(Some(true));
    wait_until(&controller, |status| matches!(status, Status::Playing { .. })).await?;
    println!("   resumed, status: {}\n", controller.status());

    // ------------------------------------------------------------------------
    // Remote command
    // ------------------------------------------------------------------------
    println!("4. Lock-screen scrub to 10:00");
    let result = controller
        .handle_remote_command(RemoteCommand::ChangePosition(Duration::from_secs(600)))
        .await;
    println!("   command status: {:?}, elapsed: {:?}\n", result, controller.elapsed_time());

    // ------------------------------------------------------------------------
    // Stop
    // ------------------------------------------------------------------------
    println!("5. Stopping");
    let rewound = controller.stop()?.await;
    println!("   rewound: {}, status: {}\n", rewound, controller.status());

    controller.shutdown().await;
    printer.abort();

    println!("=== Demo Complete ===");
    Ok(())
}

async fn wait_until(
    controller: &PlaybackController,
    predicate: impl Fn(&Status) -> bool,
) -> anyhow::Result<()> {
    let mut watch = controller.watch();
    tokio::time::timeout(
        Duration::from_secs(5),
        watch.wait_for(|snapshot| predicate(&snapshot.status)),
    )
    .await
    .context("timed out waiting for status")??;
    Ok(())
}
