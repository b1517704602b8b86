//! Narration engine error types.

use narrator_core::SettingsError;
use narrator_core::ports::{RecognitionError, SynthesisError};

/// Errors that can occur in the narration engine.
///
/// `Clone` so that failures can ride inside [`PlaybackEvent`](crate::PlaybackEvent)s.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VoiceError {
    /// Microphone / recognition permission refused.
    #[error("Microphone permission denied")]
    PermissionDenied,

    /// The speech engine is not initialised, or no content is loaded.
    #[error("Speech engine not ready")]
    EngineNotReady,

    /// A seek targeted an index outside the loaded content.
    #[error("Section index {index} out of range (0..{len})")]
    InvalidIndex { index: usize, len: usize },

    /// Speech synthesis kept failing after voice fallback and retries.
    #[error("Speech synthesis failed after {attempts} attempt(s): {message}")]
    SynthesisFailure { attempts: u32, message: String },

    /// Speech recognition failed.
    #[error("Speech recognition failed: {0}")]
    RecognitionFailure(String),

    /// A capture is already in progress.
    #[error("Voice capture is already active")]
    AlreadyActive,

    /// The operation was superseded by a newer one.
    #[error("Voice operation cancelled")]
    Cancelled,

    /// A setting was out of range.
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl From<RecognitionError> for VoiceError {
    fn from(err: RecognitionError) -> Self {
        match err {
            RecognitionError::PermissionDenied => Self::PermissionDenied,
            RecognitionError::Unavailable => Self::EngineNotReady,
            RecognitionError::Engine(message) => Self::RecognitionFailure(message),
        }
    }
}

impl From<SynthesisError> for VoiceError {
    fn from(err: SynthesisError) -> Self {
        match err {
            SynthesisError::NotReady => Self::EngineNotReady,
            other => Self::SynthesisFailure {
                attempts: 1,
                message: other.to_string(),
            },
        }
    }
}
