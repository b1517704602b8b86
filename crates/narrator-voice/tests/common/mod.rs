//! Mock synthesis and recognition ports shared by the integration tests.
//!
//! Both mocks run on Tokio's clock, so tests using
//! `#[tokio::test(start_paused = true)]` see deterministic timing.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use narrator_core::{
    ContentUnit, RecognitionError, RecognitionEvent, RecognitionOptions, RecognitionPort,
    RecognitionStream, SpeakParams, SynthesisError, SynthesisPort, UnitKind, VoiceDescriptor,
    VoiceQuality,
};
use narrator_voice::PlaybackEvent;
use tokio::sync::mpsc;

/// How long every mock utterance takes.
pub const SPEAK_TIME: Duration = Duration::from_millis(100);

// ── Synthesis ──────────────────────────────────────────────────────

/// A synthesiser that takes [`SPEAK_TIME`] per utterance and records calls.
///
/// `stop()` is counted but does not cut an utterance short, so every call
/// still delivers a (possibly stale) completion.
pub struct MockSynth {
    calls: Mutex<Vec<(String, SpeakParams)>>,
    failures_left: AtomicUsize,
    always_fail: AtomicBool,
    voices: Vec<VoiceDescriptor>,
    default_voices: Mutex<Vec<String>>,
    stops: AtomicUsize,
}

impl MockSynth {
    pub fn new() -> Arc<Self> {
        Self::with_voices(Vec::new())
    }

    pub fn with_voices(voices: Vec<VoiceDescriptor>) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            failures_left: AtomicUsize::new(0),
            always_fail: AtomicBool::new(false),
            voices,
            default_voices: Mutex::new(Vec::new()),
            stops: AtomicUsize::new(0),
        })
    }

    /// Fail the next `n` utterances.
    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn fail_always(&self) {
        self.always_fail.store(true, Ordering::SeqCst);
    }

    pub fn spoken(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(t, _)| t.clone()).collect()
    }

    pub fn params(&self) -> Vec<SpeakParams> {
        self.calls.lock().unwrap().iter().map(|(_, p)| p.clone()).collect()
    }

    pub fn default_voices(&self) -> Vec<String> {
        self.default_voices.lock().unwrap().clone()
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    fn should_fail(&self) -> bool {
        self.always_fail.load(Ordering::SeqCst)
            || self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
    }
}

#[async_trait]
impl SynthesisPort for MockSynth {
    async fn speak(&self, text: &str, params: &SpeakParams) -> Result<(), SynthesisError> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), params.clone()));
        let fail = self.should_fail();
        tokio::time::sleep(SPEAK_TIME).await;
        if fail {
            Err(SynthesisError::Engine("mock failure".into()))
        } else {
            Ok(())
        }
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn set_default_language(&self, _language: &str) {}

    fn set_default_rate(&self, _rate: f32) {}

    fn set_default_pitch(&self, _pitch: f32) {}

    fn set_default_voice(&self, voice_id: &str) {
        self.default_voices.lock().unwrap().push(voice_id.to_string());
    }

    async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SynthesisError> {
        Ok(self.voices.clone())
    }
}

pub fn voice(id: &str, language: &str, quality: VoiceQuality) -> VoiceDescriptor {
    VoiceDescriptor {
        id: id.into(),
        name: id.into(),
        language: language.into(),
        quality,
    }
}

// ── Recognition ────────────────────────────────────────────────────

/// Events one recognition run delivers, each after a delay from the previous.
pub type Script = Vec<(Duration, RecognitionEvent)>;

/// A recogniser that plays one [`Script`] per `start()` call.
///
/// Streams stay open after their script runs out, like an engine that keeps
/// listening to silence.
pub struct ScriptedRecognizer {
    scripts: Mutex<VecDeque<Script>>,
    permission: bool,
    options: Mutex<Vec<RecognitionOptions>>,
    open_streams: Mutex<Vec<mpsc::UnboundedSender<RecognitionEvent>>>,
    start_delay: Duration,
    running: AtomicBool,
    stops: AtomicUsize,
    aborts: AtomicUsize,
}

impl ScriptedRecognizer {
    pub fn new(scripts: Vec<Script>) -> Arc<Self> {
        Arc::new(Self::build(scripts, true))
    }

    /// A recogniser whose engine takes `delay` to come up on every `start()`.
    pub fn slow_start(scripts: Vec<Script>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            start_delay: delay,
            ..Self::build(scripts, true)
        })
    }

    /// A recogniser whose permission request is refused.
    pub fn denied() -> Arc<Self> {
        Arc::new(Self::build(Vec::new(), false))
    }

    fn build(scripts: Vec<Script>, permission: bool) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            permission,
            options: Mutex::new(Vec::new()),
            open_streams: Mutex::new(Vec::new()),
            start_delay: Duration::ZERO,
            running: AtomicBool::new(false),
            stops: AtomicUsize::new(0),
            aborts: AtomicUsize::new(0),
        }
    }

    pub fn starts(&self) -> usize {
        self.options.lock().unwrap().len()
    }

    pub fn options(&self) -> Vec<RecognitionOptions> {
        self.options.lock().unwrap().clone()
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn aborts(&self) -> usize {
        self.aborts.load(Ordering::SeqCst)
    }

    /// Whether the engine is listening: started and not yet stopped or aborted.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecognitionPort for ScriptedRecognizer {
    async fn request_permission(&self) -> Result<bool, RecognitionError> {
        Ok(self.permission)
    }

    async fn start(&self, options: RecognitionOptions) -> Result<RecognitionStream, RecognitionError> {
        self.options.lock().unwrap().push(options);
        let script = self.scripts.lock().unwrap().pop_front().unwrap_or_default();
        if !self.start_delay.is_zero() {
            tokio::time::sleep(self.start_delay).await;
        }
        self.running.store(true, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        self.open_streams.lock().unwrap().push(tx.clone());

        tokio::spawn(async move {
            for (delay, event) in script {
                tokio::time::sleep(delay).await;
                if tx.send(event).is_err() {
                    return;
                }
            }
        });
        Ok(rx)
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn abort(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.aborts.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn after(ms: u64, event: RecognitionEvent) -> (Duration, RecognitionEvent) {
    (Duration::from_millis(ms), event)
}

// ── Helpers ────────────────────────────────────────────────────────

pub fn paragraphs(n: usize) -> Vec<ContentUnit> {
    (0..n)
        .map(|i| ContentUnit::new(i as u64, UnitKind::Paragraph, format!("unit {i}")))
        .collect()
}

/// Receive events until `stop` matches one, returning everything seen.
pub async fn recv_until(
    rx: &mut mpsc::UnboundedReceiver<PlaybackEvent>,
    mut stop: impl FnMut(&PlaybackEvent) -> bool,
) -> Vec<PlaybackEvent> {
    let mut seen = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(60), rx.recv())
            .await
            .expect("timed out waiting for playback event")
            .expect("playback event channel closed");
        let matched = stop(&event);
        seen.push(event);
        if matched {
            return seen;
        }
    }
}

/// Drain all pending events without waiting.
pub fn drain_events(rx: &mut mpsc::UnboundedReceiver<PlaybackEvent>) -> Vec<PlaybackEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn section_changes(events: &[PlaybackEvent]) -> Vec<usize> {
    events
        .iter()
        .filter_map(|e| match e {
            PlaybackEvent::SectionChanged { index } => Some(*index),
            _ => None,
        })
        .collect()
}
