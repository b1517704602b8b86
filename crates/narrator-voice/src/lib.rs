//! Narration engine for narrator.
//!
//! - [`PlaybackController`] sequences content units through a synthesis port
//!   with per-kind pauses, play modes, retry with voice fallback and
//!   generation-checked completions.
//! - [`UtteranceFinalizer`] turns a streaming recogniser into single
//!   utterances (voice commands) or a running transcript (dictation).
//! - [`CommandRouter`] resolves utterances to the handlers of the focused
//!   screen.

#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tokio_test as _;

pub mod bindings;
pub mod bridge;
pub mod classifier;
pub mod error;
pub mod finalizer;
pub mod params;
pub mod playback;
pub mod router;
mod session;
pub mod text_utils;
pub mod transcript;

// Re-export key types for convenience
pub use bindings::player_handlers;
pub use bridge::spawn_event_bridge;
pub use classifier::{IntentClassifier, KeywordClassifier, Phrase};
pub use error::VoiceError;
pub use finalizer::{
    CaptureOutcome, DictationEvent, DictationStream, FinalizerConfig, PendingCapture,
    UtteranceFinalizer,
};
pub use params::RetryPolicy;
pub use playback::{PlaybackController, PlaybackEvent, PlaybackOptions, PlaybackSnapshot};
pub use router::{
    CommandRouter, DispatchOutcome, HandlerScope, ListenOutcome, RawTextOutcome, ScreenHandlers,
};
pub use session::Generation;
pub use transcript::{Committed, TranscriptBuffer};
