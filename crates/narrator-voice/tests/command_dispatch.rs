//! Integration tests for voice-command capture and dispatch.
//!
//! A [`common::ScriptedRecognizer`] plays canned recognition events, so the
//! full path from `listen()` through the finaliser, classifier and screen
//! registry is exercised without a microphone.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::{MockSynth, ScriptedRecognizer, after, paragraphs};
use narrator_core::{Intent, PlayMode, PlaybackStatus, RecognitionEvent};
use narrator_voice::{
    CaptureOutcome, CommandRouter, DispatchOutcome, FinalizerConfig, HandlerScope,
    KeywordClassifier, ListenOutcome, PlaybackController, PlaybackOptions, ScreenHandlers,
    UtteranceFinalizer, VoiceError, player_handlers,
};
use tokio::time::Instant;
use tokio_test::assert_ok;

fn router(recognizer: &Arc<ScriptedRecognizer>) -> CommandRouter {
    let finalizer = UtteranceFinalizer::new(recognizer.clone(), FinalizerConfig::default());
    CommandRouter::new(finalizer, Arc::new(KeywordClassifier::korean()))
}

fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let handle = Arc::clone(&count);
    (count, move || {
        handle.fetch_add(1, Ordering::SeqCst);
    })
}

#[tokio::test(start_paused = true)]
async fn first_final_result_is_dispatched_to_the_active_screen() {
    let recognizer = ScriptedRecognizer::new(vec![vec![
        after(200, RecognitionEvent::interim("다")),
        after(100, RecognitionEvent::final_result("다음")),
        after(100, RecognitionEvent::final_result("이전")),
    ]]);
    let router = router(&recognizer);
    let (next_calls, on_next) = counter();
    let (prev_calls, on_prev) = counter();
    router.register_handlers(
        "player",
        ScreenHandlers::new()
            .on(Intent::Next, on_next)
            .on(Intent::Prev, on_prev),
    );
    router.set_active_screen("player");

    let outcome = assert_ok!(router.listen().await);
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(
        outcome,
        ListenOutcome::Dispatched {
            utterance: "다음".into(),
            outcome: DispatchOutcome::Intent {
                intent: Intent::Next,
                scope: HandlerScope::Screen,
            },
        }
    );
    assert_eq!(next_calls.load(Ordering::SeqCst), 1);
    assert_eq!(prev_calls.load(Ordering::SeqCst), 0);

    let options = recognizer.options();
    assert_eq!(options.len(), 1);
    assert!(!options[0].interim_results);
    assert!(!options[0].continuous);
    assert_eq!(options[0].language, "ko-KR");
    assert_eq!(recognizer.stops(), 1);
    assert!(!router.is_listening());
}

#[tokio::test(start_paused = true)]
async fn capture_times_out_without_dispatch() {
    let recognizer = ScriptedRecognizer::new(vec![vec![after(
        500,
        RecognitionEvent::interim("음"),
    )]]);
    let router = router(&recognizer);
    let (calls, on_anything) = counter();
    router.register_handlers(
        "player",
        ScreenHandlers::new().on_raw_text(move |_| {
            on_anything();
            narrator_voice::RawTextOutcome::Handled
        }),
    );
    router.set_active_screen("player");

    let started = Instant::now();
    let outcome = assert_ok!(router.listen().await);

    assert_eq!(outcome, ListenOutcome::NothingHeard(CaptureOutcome::TimedOut));
    assert_eq!(started.elapsed(), Duration::from_millis(6_000));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(recognizer.stops(), 1);
}

#[tokio::test(start_paused = true)]
async fn unregistered_screen_does_not_receive_a_late_result() {
    let recognizer = ScriptedRecognizer::new(vec![vec![after(
        1_000,
        RecognitionEvent::final_result("다음"),
    )]]);
    let router = router(&recognizer);
    let (calls, on_next) = counter();
    router.register_handlers("player", ScreenHandlers::new().on(Intent::Next, on_next));
    router.set_active_screen("player");

    let listening = tokio::spawn({
        let router = router.clone();
        async move { router.listen().await }
    });
    tokio::time::sleep(Duration::from_millis(500)).await;
    router.register_handlers("player", ScreenHandlers::new());

    let outcome = assert_ok!(listening.await.unwrap());
    assert_eq!(
        outcome,
        ListenOutcome::Dispatched {
            utterance: "다음".into(),
            outcome: DispatchOutcome::NotUnderstood {
                intent: Some(Intent::Next)
            },
        }
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn global_fallback_handles_library_from_any_screen() {
    let recognizer = ScriptedRecognizer::new(vec![vec![after(
        100,
        RecognitionEvent::final_result("내 서재로 가자"),
    )]]);
    let router = router(&recognizer);
    let (calls, open_library) = counter();
    router.register_handlers("quiz", ScreenHandlers::new().on(Intent::Next, || {}));
    router.set_active_screen("quiz");
    router.set_global_handler(Intent::OpenLibrary, open_library);

    let outcome = assert_ok!(router.listen().await);

    assert!(matches!(
        outcome,
        ListenOutcome::Dispatched {
            outcome: DispatchOutcome::Intent {
                scope: HandlerScope::Global,
                ..
            },
            ..
        }
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn only_one_capture_runs_at_a_time() {
    let recognizer = ScriptedRecognizer::new(vec![vec![after(
        1_000,
        RecognitionEvent::final_result("다음"),
    )]]);
    let router = router(&recognizer);

    let first = tokio::spawn({
        let router = router.clone();
        async move { router.listen().await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(router.listen().await, Err(VoiceError::AlreadyActive));
    assert_ok!(first.await.unwrap());
    assert_eq!(recognizer.starts(), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_listening_cancels_the_capture() {
    let recognizer = ScriptedRecognizer::new(vec![vec![after(
        3_000,
        RecognitionEvent::final_result("다음"),
    )]]);
    let router = router(&recognizer);

    let listening = tokio::spawn({
        let router = router.clone();
        async move { router.listen().await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    router.stop_listening();

    let outcome = assert_ok!(listening.await.unwrap());
    assert_eq!(outcome, ListenOutcome::NothingHeard(CaptureOutcome::Cancelled));
    assert!(!router.is_listening());
}

#[tokio::test(start_paused = true)]
async fn permission_denied_is_terminal() {
    let recognizer = ScriptedRecognizer::denied();
    let router = router(&recognizer);

    assert_eq!(router.listen().await, Err(VoiceError::PermissionDenied));
    assert_eq!(recognizer.starts(), 0);
}

#[tokio::test(start_paused = true)]
async fn recognition_error_ends_a_single_capture() {
    let recognizer = ScriptedRecognizer::new(vec![vec![after(
        100,
        RecognitionEvent::Error("network".into()),
    )]]);
    let router = router(&recognizer);

    assert_eq!(
        router.listen().await,
        Err(VoiceError::RecognitionFailure("network".into()))
    );
    assert_eq!(recognizer.starts(), 1);
}

#[tokio::test(start_paused = true)]
async fn player_bindings_pause_before_listening_and_follow_commands() {
    let synth = MockSynth::new();
    let (player, _rx) = PlaybackController::new(synth.clone());
    player.initialize(
        paragraphs(3),
        0,
        PlaybackOptions {
            mode: PlayMode::Single,
            ..PlaybackOptions::default()
        },
    );
    assert_ok!(player.play());

    let recognizer = ScriptedRecognizer::new(vec![
        vec![after(300, RecognitionEvent::final_result("다음 챕터"))],
        vec![after(300, RecognitionEvent::final_result("일시정지"))],
    ]);
    let router = router(&recognizer);
    router.register_handlers("player", player_handlers(&player));
    router.set_active_screen("player");

    let listening = tokio::spawn({
        let router = router.clone();
        async move { router.listen().await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(player.status(), PlaybackStatus::Paused);

    assert_ok!(listening.await.unwrap());
    assert_eq!(player.current_index(), 1);
    assert_eq!(player.status(), PlaybackStatus::Playing);

    // Narration is paused for the capture, so "일시정지" toggles it back on.
    assert_ok!(router.listen().await);
    assert_eq!(player.status(), PlaybackStatus::Playing);
    assert_eq!(player.current_index(), 1);
}
