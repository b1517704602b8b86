//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the narration engine expects from the
//! platform. They contain no implementation details and use only domain
//! types.
//!
//! # Design Rules
//!
//! - Speech engines are black boxes: the engine only sequences calls and
//!   interprets terminal outcomes.
//! - Callback-style platform APIs are adapted to futures (synthesis) and
//!   channels (recognition) inside the adapter, never here.

pub mod event_emitter;
pub mod recognition;
pub mod synthesis;

pub use event_emitter::{NarratorEventEmitter, NoopEmitter};
pub use recognition::{
    RecognitionError, RecognitionEvent, RecognitionOptions, RecognitionPort, RecognitionStream,
};
pub use synthesis::{SpeakParams, SynthesisError, SynthesisPort, VoiceDescriptor, VoiceQuality};
