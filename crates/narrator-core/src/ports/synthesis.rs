//! Speech synthesis port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── DTOs ─────────────────────────────────────────────────────────────────────

/// Parameters for a single `speak` invocation.
///
/// These are the values actually sent to the engine, after any rate capping
/// or pitch compensation has been applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakParams {
    /// Voice to use; `None` lets the engine pick its default.
    pub voice_id: Option<String>,
    /// BCP-47 language tag.
    pub language: String,
    /// Engine rate multiplier.
    pub rate: f32,
    /// Engine pitch multiplier.
    pub pitch: f32,
    /// Output volume (0.0–1.0).
    pub volume: f32,
}

/// Installed-voice quality tier reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VoiceQuality {
    Default,
    Enhanced,
}

/// A voice the engine can speak with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceDescriptor {
    /// Voice identifier used in API calls.
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// BCP-47 language tag.
    pub language: String,
    /// Quality tier.
    pub quality: VoiceQuality,
}

impl VoiceDescriptor {
    /// Whether this voice speaks `language`, comparing primary subtags
    /// (`"ko-KR"` matches `"ko"` and `"ko_KR"`).
    pub fn speaks(&self, language: &str) -> bool {
        primary_subtag(&self.language).eq_ignore_ascii_case(primary_subtag(language))
    }
}

fn primary_subtag(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}

// ── Error ─────────────────────────────────────────────────────────────────────

/// Errors reported by a synthesis engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    /// The engine has not finished initialising.
    #[error("Speech engine is not ready")]
    NotReady,

    /// The requested voice is not installed or failed to load.
    #[error("Voice unavailable: {0}")]
    VoiceUnavailable(String),

    /// The engine reported an error while speaking.
    #[error("Speech engine error: {0}")]
    Engine(String),
}

// ── Port trait ────────────────────────────────────────────────────────────────

/// A one-shot text-to-speech engine.
///
/// Every call to [`speak`](Self::speak) resolves exactly once: `Ok(())` when
/// the utterance finished (or was stopped), `Err` when the engine failed.
/// [`stop`](Self::stop) is a request, not a guarantee; a `speak` future may
/// still resolve after it returns.
#[async_trait]
pub trait SynthesisPort: Send + Sync {
    /// Whether the engine is initialised and able to speak.
    fn is_ready(&self) -> bool {
        true
    }

    /// Speak `text` and resolve when the utterance terminates.
    async fn speak(&self, text: &str, params: &SpeakParams) -> Result<(), SynthesisError>;

    /// Ask the engine to stop the current utterance.
    fn stop(&self);

    /// Set the engine-wide default language.
    fn set_default_language(&self, language: &str);

    /// Set the engine-wide default rate.
    fn set_default_rate(&self, rate: f32);

    /// Set the engine-wide default pitch.
    fn set_default_pitch(&self, pitch: f32);

    /// Set the engine-wide default voice.
    fn set_default_voice(&self, voice_id: &str);

    /// List installed voices.
    async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>, SynthesisError>;
}
