//! Remote command routing and command-center registration.

mod support;

use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    EngineSignal, RemoteCommandCenter, RemoteCommandKind, RemoteCommandRegistration,
    TimeControlStatus,
};
use core_playback::{
    CommandStatus, PlaybackConfiguration, PlaybackController, RemoteCommand, Status,
};
use core_runtime::config::CoreConfig;
use mockall::mock;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;
use support::*;

mock! {
    pub CommandCenter {}

    impl RemoteCommandCenter for CommandCenter {
        fn register(&self, registration: &RemoteCommandRegistration) -> BridgeResult<()>;
        fn unregister(&self) -> BridgeResult<()>;
        fn set_preferred_skip_intervals(&self, forward: Duration, backward: Duration) -> BridgeResult<()>;
    }
}

#[derive(Debug, Clone, PartialEq)]
enum CenterCall {
    Register(RemoteCommandRegistration),
    Unregister,
    SkipIntervals(Duration, Duration),
}

/// A command center that reports every call on `calls`.
fn recording_center() -> (MockCommandCenter, mpsc::Receiver<CenterCall>) {
    let (sender, calls) = mpsc::channel();
    let mut center = MockCommandCenter::new();

    let tx = sender.clone();
    center.expect_register().returning(move |registration| {
        tx.send(CenterCall::Register(registration.clone())).unwrap();
        Ok(())
    });
    let tx = sender.clone();
    center.expect_unregister().returning(move || {
        tx.send(CenterCall::Unregister).unwrap();
        Ok(())
    });
    center
        .expect_set_preferred_skip_intervals()
        .returning(move |forward, backward| {
            sender
                .send(CenterCall::SkipIntervals(forward, backward))
                .unwrap();
            Ok(())
        });

    (center, calls)
}

fn spawn_with_center(engine: &ScriptedEngine, center: MockCommandCenter) -> PlaybackController {
    init_tracing();
    let config = CoreConfig::builder()
        .engine(Arc::new(engine.clone()))
        .remote_commands(Arc::new(center))
        .build()
        .unwrap();
    PlaybackController::spawn(config).unwrap()
}

fn default_registration() -> RemoteCommandRegistration {
    RemoteCommandRegistration::all(Duration::from_secs(30), Duration::from_secs(15))
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_audio_item_registers_every_command() {
    let engine = ScriptedEngine::new().auto_ready();
    let (center, calls) = recording_center();
    let controller = spawn_with_center(&engine, center);

    start_playing(&controller, &engine).await;
    controller.shutdown().await;

    let received: Vec<_> = calls.try_iter().collect();
    assert_eq!(
        received,
        vec![
            CenterCall::Register(default_registration()),
            CenterCall::Unregister
        ]
    );

    let CenterCall::Register(registration) = &received[0] else {
        unreachable!()
    };
    for kind in RemoteCommandKind::ALL {
        assert!(registration.is_enabled(kind));
    }
}

#[tokio::test]
async fn test_video_item_unregisters_commands() {
    let engine = ScriptedEngine::new().auto_ready();
    let (center, calls) = recording_center();
    let controller = spawn_with_center(&engine, center);

    attach(
        &controller,
        &engine,
        track(),
        PlaybackConfiguration::default(),
    )
    .await;
    let first_item = engine.current_item();
    controller
        .prepare_to_play(clip(), PlaybackConfiguration::default())
        .unwrap();
    eventually(|| engine.current_item().is_some() && engine.current_item() != first_item).await;
    controller.shutdown().await;

    let received: Vec<_> = calls.try_iter().collect();
    assert_eq!(
        received,
        vec![
            CenterCall::Register(default_registration()),
            CenterCall::Unregister
        ]
    );
}

#[tokio::test]
async fn test_skip_interval_changes_reach_the_center() {
    let engine = ScriptedEngine::new().auto_ready();
    let (center, calls) = recording_center();
    let controller = spawn_with_center(&engine, center);

    controller
        .set_forward_skip_interval(Duration::from_secs(45))
        .unwrap();
    controller
        .set_backward_skip_interval(Duration::from_secs(10))
        .unwrap();
    attach(
        &controller,
        &engine,
        track(),
        PlaybackConfiguration::default(),
    )
    .await;

    let received: Vec<_> = calls.try_iter().collect();
    assert_eq!(
        received,
        vec![
            CenterCall::SkipIntervals(Duration::from_secs(45), Duration::from_secs(15)),
            CenterCall::SkipIntervals(Duration::from_secs(45), Duration::from_secs(10)),
            CenterCall::Register(RemoteCommandRegistration::all(
                Duration::from_secs(45),
                Duration::from_secs(10)
            )),
        ]
    );
}

#[tokio::test]
async fn test_failed_registration_does_not_block_playback() {
    let engine = ScriptedEngine::new().auto_ready();
    let mut center = MockCommandCenter::new();
    center.expect_register().returning(|_| {
        Err(bridge_traits::BridgeError::NotAvailable(
            "no command center".to_string(),
        ))
    });
    center.expect_unregister().never();
    let controller = spawn_with_center(&engine, center);

    start_playing(&controller, &engine).await;
    assert!(controller.status().is_playing());
}

// ============================================================================
// Routing
// ============================================================================

#[tokio::test]
async fn test_commands_without_item() {
    let engine = ScriptedEngine::new();
    let controller = spawn_controller(&engine);

    for command in [
        RemoteCommand::Play,
        RemoteCommand::Pause,
        RemoteCommand::TogglePlayPause,
        RemoteCommand::SkipForward,
        RemoteCommand::SkipBackward,
        RemoteCommand::ChangePosition(Duration::from_secs(10)),
    ] {
        assert_eq!(
            controller.handle_remote_command(command).await,
            CommandStatus::NoActionableItem
        );
    }
    assert_eq!(controller.status(), Status::Idle);
}

#[tokio::test]
async fn test_play_pause_commands() {
    let engine = ScriptedEngine::new().auto_ready();
    let controller = spawn_controller(&engine);
    attach(
        &controller,
        &engine,
        track(),
        PlaybackConfiguration::default(),
    )
    .await;

    assert_eq!(
        controller.handle_remote_command(RemoteCommand::Play).await,
        CommandStatus::Success
    );
    flush(&controller, &engine).await;
    assert!(controller.status().is_playing());

    // Already playing is acknowledged without touching the engine.
    let before = engine.count(|call| *call == EngineCall::Play);
    assert_eq!(
        controller.handle_remote_command(RemoteCommand::Play).await,
        CommandStatus::Success
    );
    assert_eq!(engine.count(|call| *call == EngineCall::Play), before);

    assert_eq!(
        controller.handle_remote_command(RemoteCommand::Pause).await,
        CommandStatus::Success
    );
    flush(&controller, &engine).await;
    assert_eq!(controller.status(), Status::Paused { manually: true });

    assert_eq!(
        controller
            .handle_remote_command(RemoteCommand::TogglePlayPause)
            .await,
        CommandStatus::Success
    );
    assert!(controller.status().is_playing());
    flush(&controller, &engine).await;

    // A system pause is upgraded to a manual one.
    engine.emit(EngineSignal::TimeControl(TimeControlStatus::Paused));
    wait_for_status(&controller, Status::Paused { manually: false }).await;
    assert_eq!(
        controller.handle_remote_command(RemoteCommand::Pause).await,
        CommandStatus::Success
    );
    assert_eq!(controller.status(), Status::Paused { manually: true });
}

#[tokio::test]
async fn test_position_commands() {
    let engine = ScriptedEngine::new().auto_ready();
    let controller = spawn_controller(&engine);
    attach(
        &controller,
        &engine,
        track(),
        PlaybackConfiguration::default(),
    )
    .await;

    assert_eq!(
        controller
            .handle_remote_command(RemoteCommand::ChangePosition(Duration::from_secs(90)))
            .await,
        CommandStatus::Success
    );
    wait_for(&controller, |snapshot| {
        snapshot.elapsed_time == Duration::from_secs(90)
    })
    .await;

    assert_eq!(
        controller
            .handle_remote_command(RemoteCommand::SkipBackward)
            .await,
        CommandStatus::Success
    );
    wait_for(&controller, |snapshot| {
        snapshot.elapsed_time == Duration::from_secs(75)
    })
    .await;

    assert_eq!(
        controller
            .handle_remote_command(RemoteCommand::SkipForward)
            .await,
        CommandStatus::Success
    );
    wait_for(&controller, |snapshot| {
        snapshot.elapsed_time == Duration::from_secs(105)
    })
    .await;

    assert!(engine.calls().contains(&EngineCall::Seek(
        Duration::from_secs(90),
        bridge_traits::SeekTolerance::EXACT
    )));
}

#[tokio::test]
async fn test_buffering_accepts_only_position_commands() {
    let engine = ScriptedEngine::new().auto_ready();
    let controller = spawn_controller(&engine);
    start_playing(&controller, &engine).await;

    engine.emit(EngineSignal::TimeControl(
        TimeControlStatus::WaitingToPlayAtSpecifiedRate,
    ));
    wait_for_status(&controller, Status::Buffering).await;

    for command in [
        RemoteCommand::Play,
        RemoteCommand::Pause,
        RemoteCommand::TogglePlayPause,
    ] {
        assert_eq!(
            controller.handle_remote_command(command).await,
            CommandStatus::NoActionableItem
        );
    }
    assert_eq!(
        controller
            .handle_remote_command(RemoteCommand::SkipForward)
            .await,
        CommandStatus::Success
    );
    assert_eq!(controller.status(), Status::Buffering);
}

#[tokio::test]
async fn test_commands_rejected_after_shutdown() {
    let engine = ScriptedEngine::new();
    let controller = spawn_controller(&engine);
    controller.shutdown().await;

    assert_eq!(
        controller
            .handle_remote_command(RemoteCommand::TogglePlayPause)
            .await,
        CommandStatus::Rejected
    );
}
