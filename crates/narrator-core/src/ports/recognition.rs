//! Speech recognition port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

// ── DTOs ─────────────────────────────────────────────────────────────────────

/// Options for one recognition run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionOptions {
    /// BCP-47 language tag.
    pub language: String,
    /// Whether the engine should report interim (non-final) results.
    pub interim_results: bool,
    /// Whether the engine should keep listening across utterances.
    pub continuous: bool,
}

/// An event emitted by a running recognition engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// A transcript for the current utterance.
    Result {
        /// Best transcript candidate.
        transcript: String,
        /// Whether the engine considers this utterance complete.
        is_final: bool,
    },

    /// The engine stopped listening on its own.
    End,

    /// The engine reported an error. Recognition may or may not continue.
    Error(String),
}

impl RecognitionEvent {
    /// Shorthand for a final result.
    pub fn final_result(transcript: impl Into<String>) -> Self {
        Self::Result {
            transcript: transcript.into(),
            is_final: true,
        }
    }

    /// Shorthand for an interim result.
    pub fn interim(transcript: impl Into<String>) -> Self {
        Self::Result {
            transcript: transcript.into(),
            is_final: false,
        }
    }
}

/// Stream of events for one recognition run.
///
/// The adapter holds the sending half; dropping it is equivalent to `End`.
pub type RecognitionStream = mpsc::UnboundedReceiver<RecognitionEvent>;

// ── Error ─────────────────────────────────────────────────────────────────────

/// Errors returned when starting recognition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    /// Microphone or recognition permission was refused.
    #[error("Microphone / speech recognition permission denied")]
    PermissionDenied,

    /// The engine is not available on this device.
    #[error("Speech recognition is not available")]
    Unavailable,

    /// The engine failed to start.
    #[error("Speech recognition engine error: {0}")]
    Engine(String),
}

// ── Port trait ────────────────────────────────────────────────────────────────

/// A streaming speech-to-text engine.
///
/// At most one run is active per port; calling [`start`](Self::start) while
/// a run is active replaces it.
#[async_trait]
pub trait RecognitionPort: Send + Sync {
    /// Ask for microphone / recognition permission. Returns whether it was granted.
    async fn request_permission(&self) -> Result<bool, RecognitionError>;

    /// Start a recognition run and return its event stream.
    async fn start(&self, options: RecognitionOptions) -> Result<RecognitionStream, RecognitionError>;

    /// Stop listening and finalise whatever was heard.
    fn stop(&self);

    /// Stop listening and discard whatever was heard.
    fn abort(&self);
}
