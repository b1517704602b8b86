//! A synthesiser that prints each utterance and waits as long as reading it
//! aloud would take.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use narrator_core::{SpeakParams, SynthesisError, SynthesisPort, VoiceDescriptor, VoiceQuality};
use tokio::sync::Notify;
use tracing::debug;

/// Reading pace at rate 1.0.
const PER_CHAR: Duration = Duration::from_millis(70);

/// Shortest utterance, so one-word sections are still audible.
const MIN_UTTERANCE: Duration = Duration::from_millis(300);

/// How long `text` takes to read at `rate`.
pub fn utterance_duration(text: &str, rate: f32) -> Duration {
    let chars = text.chars().filter(|c| !c.is_whitespace()).count();
    let rate = if rate.is_finite() && rate > 0.0 { rate } else { 1.0 };
    let base = PER_CHAR * u32::try_from(chars).unwrap_or(u32::MAX);
    base.div_f32(rate).max(MIN_UTTERANCE)
}

#[derive(Debug, Default)]
struct EngineDefaults {
    language: String,
    rate: f32,
    pitch: f32,
    voice: Option<String>,
}

/// Console stand-in for a device text-to-speech engine.
pub struct ConsoleSynth {
    defaults: Mutex<EngineDefaults>,
    interrupt: Notify,
    voices: Vec<VoiceDescriptor>,
}

impl ConsoleSynth {
    pub fn new() -> Self {
        Self {
            defaults: Mutex::new(EngineDefaults::default()),
            interrupt: Notify::new(),
            voices: vec![
                voice("console-ko", "Console Korean", "ko-KR", VoiceQuality::Default),
                voice("console-ko-hd", "Console Korean HD", "ko-KR", VoiceQuality::Enhanced),
                voice("console-en", "Console English", "en-US", VoiceQuality::Default),
            ],
        }
    }

    fn knows(&self, voice_id: &str) -> bool {
        self.voices.iter().any(|v| v.id == voice_id)
    }
}

impl Default for ConsoleSynth {
    fn default() -> Self {
        Self::new()
    }
}

fn voice(id: &str, name: &str, language: &str, quality: VoiceQuality) -> VoiceDescriptor {
    VoiceDescriptor {
        id: id.into(),
        name: name.into(),
        language: language.into(),
        quality,
    }
}

#[async_trait]
impl SynthesisPort for ConsoleSynth {
    async fn speak(&self, text: &str, params: &SpeakParams) -> Result<(), SynthesisError> {
        if let Some(voice_id) = params.voice_id.as_deref() {
            if !self.knows(voice_id) {
                return Err(SynthesisError::VoiceUnavailable(voice_id.to_string()));
            }
        }

        let pace = utterance_duration(text, params.rate);
        debug!(
            voice = params.voice_id.as_deref().unwrap_or("default"),
            rate = params.rate,
            pace_ms = pace.as_millis(),
            "Speaking"
        );
        println!("  » {text}");

        let interrupted = self.interrupt.notified();
        tokio::select! {
            () = tokio::time::sleep(pace) => {}
            () = interrupted => debug!("Utterance interrupted"),
        }
        Ok(())
    }

    fn stop(&self) {
        self.interrupt.notify_waiters();
    }

    fn set_default_language(&self, language: &str) {
        let mut defaults = self.defaults.lock().unwrap_or_else(PoisonError::into_inner);
        language.clone_into(&mut defaults.language);
    }

    fn set_default_rate(&self, rate: f32) {
        self.defaults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .rate = rate;
    }

    fn set_default_pitch(&self, pitch: f32) {
        self.defaults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pitch = pitch;
    }

    fn set_default_voice(&self, voice_id: &str) {
        self.defaults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .voice = Some(voice_id.to_string());
    }

    async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SynthesisError> {
        Ok(self.voices.clone())
    }
}
