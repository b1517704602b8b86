//! Terminal implementations of the narration ports.

pub mod console_emitter;
pub mod console_synth;
pub mod line_recognizer;

pub use console_emitter::ConsoleEmitter;
pub use console_synth::ConsoleSynth;
pub use line_recognizer::LineRecognizer;
