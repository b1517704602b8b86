//! Domain types for narrated content, playback and voice commands.
//!
//! These are pure data types with no infrastructure dependencies.

mod content;
mod intent;
mod playback;

pub use content::{Chapter, ContentUnit, UnitKind};
pub use intent::Intent;
pub use playback::{ParsePlayModeError, PauseDurations, PlayMode, PlaybackStatus, VoiceParams};
