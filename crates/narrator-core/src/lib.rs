//! Core domain types and port definitions for narrator.
//!
//! This crate holds everything the narration engine and its adapters agree
//! on: content units and playback vocabulary, the synthesis and recognition
//! port traits, the canonical event union, and user settings. It contains no
//! runtime behaviour beyond validation and small pure helpers.

#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod events;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    Chapter, ContentUnit, Intent, PauseDurations, PlayMode, PlaybackStatus, UnitKind, VoiceParams,
};
pub use events::NarratorEvent;
pub use ports::{
    NarratorEventEmitter, NoopEmitter, RecognitionError, RecognitionEvent, RecognitionOptions,
    RecognitionPort, RecognitionStream, SpeakParams, SynthesisError, SynthesisPort,
    VoiceDescriptor, VoiceQuality,
};
pub use settings::{NarrationSettings, SettingsError, SettingsUpdate, validate_settings};
