//! End-to-end focus-session scenarios through the assembled service.
//!
//! These tests build a [`Hyperfocus`] bundle from config with scripted
//! generators and drive sessions with paused tokio time, checking the streamed
//! checkpoint sequence, guardian text and wall-clock schedule together.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use hyperfocus::Hyperfocus;
use hyperfocus::core::session::CheckpointKind;
use hyperfocus::core::types::{FocusMode, Role};
use hyperfocus::io::config::HyperfocusConfig;
use hyperfocus::streamer::{ControlError, SessionMessage};
use hyperfocus::test_support::{FailingGenerator, ScriptedGenerator};
use tokio::time::Instant;

fn config(tick_secs: u64) -> HyperfocusConfig {
    let mut config = HyperfocusConfig::default();
    config.session.tick_period_secs = tick_secs;
    config
}

fn kinds(messages: &[SessionMessage]) -> Vec<&'static str> {
    messages.iter().map(SessionMessage::kind).collect()
}

/// A default-length session with a silent model:
///
/// ```text
/// t=0s   start      (0, 25)
/// t=60s  mid_check  (10, 15)
/// t=120s mid_check  (20, 5)
/// t=150s end        (25, 0) completed
/// ```
#[tokio::test(start_paused = true)]
async fn default_session_runs_to_completion_with_fallback_messages() {
    let app = Hyperfocus::new(&config(60), Arc::new(FailingGenerator)).expect("app");
    let began = Instant::now();

    let session = app
        .streamer()
        .start(FocusMode::Hyperfocus, app.default_target_minutes(), None)
        .expect("start");
    let messages: Vec<SessionMessage> = session.into_stream().collect().await;

    assert_eq!(kinds(&messages), vec!["start", "mid_check", "mid_check", "end"]);
    assert_eq!(messages[0].message, "Let's begin. You've got this! 💪");
    assert_eq!(messages[1].message, "15 minutes remaining. Keep going!");
    assert_eq!(messages[2].message, "5 minutes remaining. Keep going!");
    assert_eq!(
        messages[3].checkpoint.kind,
        CheckpointKind::End {
            completed: true,
            duration_minutes: 25
        }
    );
    assert!(messages.iter().all(|m| m.mode == FocusMode::Hyperfocus));
    assert_eq!(began.elapsed(), Duration::from_secs(150));
}

/// Distractions and an early stop on a 30 minute scatterfocus session.
#[tokio::test(start_paused = true)]
async fn distracted_session_stopped_after_first_check_in() {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .reply(Role::Guardian, "Let your mind roam.")
            .reply(Role::Guardian, "Ten minutes in, nice wandering.")
            .reply(Role::Guardian, "Back to the walk.")
            .reply(Role::Guardian, "Back again, gently.")
            .reply(Role::Guardian, "Good stretch of thinking."),
    );
    let app = Hyperfocus::new(&config(60), generator.clone()).expect("app");
    let mut session = app
        .streamer()
        .start(FocusMode::Scatterfocus, 30, Some("name the product".to_string()))
        .expect("start");
    let control = session.control().clone();

    let mut messages = vec![
        session.next_message().await.expect("start"),
        session.next_message().await.expect("mid"),
    ];
    for _ in 0..2 {
        control.log_distraction().await.expect("distraction");
        messages.push(session.next_message().await.expect("distraction"));
    }
    control.stop().await.expect("stop");
    while let Some(message) = session.next_message().await {
        messages.push(message);
    }

    assert_eq!(
        kinds(&messages),
        vec!["start", "mid_check", "distraction", "distraction", "end"]
    );
    let counts: Vec<u32> = messages
        .iter()
        .map(|m| m.checkpoint.distraction_count)
        .collect();
    assert_eq!(counts, vec![0, 0, 1, 2, 2]);
    let end = messages.last().expect("end");
    assert_eq!(
        end.checkpoint.kind,
        CheckpointKind::End {
            completed: false,
            duration_minutes: 10
        }
    );
    assert_eq!(end.message, "Good stretch of thinking.");

    let prompts: Vec<String> = generator.requests().into_iter().map(|r| r.prompt).collect();
    assert!(prompts[0].contains("name the product"));
    assert!(prompts[1].contains("10 minutes elapsed, 20 minutes remaining."));
    assert!(prompts[3].contains("distraction #2"));
    assert!(prompts[4].contains("ended early"));

    assert_eq!(control.log_distraction().await, Err(ControlError::Closed));
}

/// Sessions started from one bundle do not interfere with each other.
#[tokio::test(start_paused = true)]
async fn concurrent_sessions_are_independent() {
    let app = Hyperfocus::new(&config(60), Arc::new(FailingGenerator)).expect("app");
    let short = app
        .streamer()
        .start(FocusMode::Hyperfocus, 5, None)
        .expect("short");
    let mut long = app
        .streamer()
        .start(FocusMode::Hyperfocus, 45, None)
        .expect("long");
    long.next_message().await.expect("long start");

    let short_messages: Vec<SessionMessage> = short.into_stream().collect().await;
    assert_eq!(kinds(&short_messages), vec!["start", "end"]);

    long.control().stop().await.expect("stop long");
    let end = long.next_message().await.expect("long end");
    assert_eq!(
        end.checkpoint.kind,
        CheckpointKind::End {
            completed: false,
            duration_minutes: 0
        }
    );
}
