//! Audio-route interruption handling.

mod support;

use bridge_traits::{EngineSignal, InterruptionEvent, TimeControlStatus};
use core_playback::{PlaybackConfiguration, PlaybackController, PlaybackNotification, Status};
use std::time::Duration;
use support::*;

fn ended(should_resume: Option<bool>) -> InterruptionEvent {
    InterruptionEvent::Ended { should_resume }
}

async fn playing_with_session() -> (ScriptedEngine, ScriptedSession, PlaybackController) {
    let engine = ScriptedEngine::new().auto_ready();
    let session = ScriptedSession::new();
    let controller = spawn_with_session(&engine, &session);
    start_playing(&controller, &engine).await;
    (engine, session, controller)
}

/// The engine stops producing sound when the route is taken away.
async fn interrupt(
    controller: &PlaybackController,
    engine: &ScriptedEngine,
    session: &ScriptedSession,
) {
    session.interrupt(InterruptionEvent::Began);
    flush_interruptions(controller, session).await;
    engine.emit(EngineSignal::TimeControl(TimeControlStatus::Paused));
    flush(controller, engine).await;
    assert_eq!(controller.status(), Status::Paused { manually: false });
}

fn plays(engine: &ScriptedEngine) -> usize {
    engine.count(|call| *call == EngineCall::Play)
}

#[tokio::test]
async fn test_system_pause_resumes_when_interruption_ends() {
    let (engine, session, controller) = playing_with_session().await;
    interrupt(&controller, &engine, &session).await;
    let mut events = controller.subscribe();

    session.interrupt(ended(Some(true)));
    flush_interruptions(&controller, &session).await;

    assert_eq!(
        controller.status(),
        Status::Playing {
            from_beginning: false
        }
    );
    assert!(drain(&mut events).contains(&PlaybackNotification::DidResumePlayback));
}

#[tokio::test]
async fn test_play_is_ignored_while_interrupted() {
    let (engine, session, controller) = playing_with_session().await;
    interrupt(&controller, &engine, &session).await;
    let before = plays(&engine);

    controller.play().unwrap();
    controller.toggle_play_pause().unwrap();
    controller.settle().await.unwrap();

    assert_eq!(controller.status(), Status::Paused { manually: false });
    assert_eq!(plays(&engine), before);

    // Ending without a hint resumes a system pause.
    session.interrupt(ended(None));
    flush_interruptions(&controller, &session).await;

    assert!(controller.status().is_playing());
    assert_eq!(plays(&engine), before + 1);
}

#[tokio::test]
async fn test_system_pause_stays_when_told_not_to_resume() {
    let (engine, session, controller) = playing_with_session().await;
    interrupt(&controller, &engine, &session).await;

    session.interrupt(ended(Some(false)));
    flush_interruptions(&controller, &session).await;
    assert_eq!(controller.status(), Status::Paused { manually: false });

    // The interruption is over, so a user play goes through again.
    controller.play().unwrap();
    controller.settle().await.unwrap();
    assert!(controller.status().is_playing());
}

#[tokio::test]
async fn test_manual_pause_is_never_resumed() {
    let (engine, session, controller) = playing_with_session().await;
    controller.pause(true).unwrap();
    flush(&controller, &engine).await;
    let before = plays(&engine);

    for hint in [Some(true), None] {
        session.interrupt(InterruptionEvent::Began);
        session.interrupt(ended(hint));
        flush_interruptions(&controller, &session).await;

        assert_eq!(controller.status(), Status::Paused { manually: true });
        assert_eq!(plays(&engine), before);
    }
}

#[tokio::test]
async fn test_still_playing_is_resynced() {
    let (engine, session, controller) = playing_with_session().await;
    let before = plays(&engine);

    // The engine never reported a pause.
    session.interrupt(InterruptionEvent::Began);
    session.interrupt(ended(Some(true)));
    flush_interruptions(&controller, &session).await;
    assert!(controller.status().is_playing());
    assert_eq!(plays(&engine), before + 1);

    session.interrupt(InterruptionEvent::Began);
    session.interrupt(ended(None));
    flush_interruptions(&controller, &session).await;
    assert!(controller.status().is_playing());
    assert_eq!(plays(&engine), before + 2);
}

#[tokio::test]
async fn test_still_playing_pauses_when_told_not_to_resume() {
    let (engine, session, controller) = playing_with_session().await;
    let mut events = controller.subscribe();

    session.interrupt(InterruptionEvent::Began);
    session.interrupt(ended(Some(false)));
    flush_interruptions(&controller, &session).await;

    assert_eq!(controller.status(), Status::Paused { manually: false });
    assert_eq!(engine.count(|call| *call == EngineCall::Pause), 1);
    assert!(drain(&mut events).contains(&PlaybackNotification::DidPausePlayback));
}

#[tokio::test]
async fn test_interruption_rewrites_preparation_intent() {
    let engine = ScriptedEngine::new();
    let session = ScriptedSession::new();
    let controller = spawn_with_session(&engine, &session);
    attach(
        &controller,
        &engine,
        track(),
        PlaybackConfiguration::default().with_start_time(Duration::from_secs(5)),
    )
    .await;

    session.interrupt(InterruptionEvent::Began);
    session.interrupt(ended(Some(true)));
    flush_interruptions(&controller, &session).await;
    assert_eq!(
        controller.status(),
        Status::Preparing {
            play_when_ready: true,
            start_time: Duration::from_secs(5),
        }
    );

    // No hint leaves the intent alone.
    session.interrupt(InterruptionEvent::Began);
    session.interrupt(ended(None));
    flush_interruptions(&controller, &session).await;
    assert_eq!(
        controller.status(),
        Status::Preparing {
            play_when_ready: true,
            start_time: Duration::from_secs(5),
        }
    );

    engine.make_ready();
    let snapshot = wait_for(&controller, |snapshot| snapshot.status.is_playing()).await;
    assert_eq!(snapshot.elapsed_time, Duration::from_secs(5));
}

#[tokio::test]
async fn test_interruptions_before_attach_are_ignored() {
    let engine = ScriptedEngine::new().auto_ready().holding_loads();
    let session = ScriptedSession::new();
    let controller = spawn_with_session(&engine, &session);

    controller
        .prepare_to_play(track(), PlaybackConfiguration::autoplay())
        .unwrap();
    eventually(|| engine.held_load_count() == 1).await;

    session.interrupt(InterruptionEvent::Began);
    flush_interruptions(&controller, &session).await;

    engine.release_load(0);
    wait_for(&controller, |snapshot| snapshot.status.is_playing()).await;
}

#[tokio::test]
async fn test_video_ignores_interruptions() {
    let engine = ScriptedEngine::new().auto_ready();
    let session = ScriptedSession::new();
    let controller = spawn_with_session(&engine, &session);
    controller
        .prepare_to_play(clip(), PlaybackConfiguration::autoplay())
        .unwrap();
    wait_for(&controller, |snapshot| snapshot.status.is_playing()).await;
    flush(&controller, &engine).await;

    session.interrupt(InterruptionEvent::Began);
    flush_interruptions(&controller, &session).await;

    controller.pause(true).unwrap();
    controller.play().unwrap();
    flush(&controller, &engine).await;
    assert_eq!(
        controller.status(),
        Status::Playing {
            from_beginning: false
        }
    );

    session.interrupt(ended(Some(false)));
    flush_interruptions(&controller, &session).await;
    assert!(controller.status().is_playing());
}
