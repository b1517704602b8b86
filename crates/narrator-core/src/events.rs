//! Canonical event union forwarded from the engine to UI adapters.
//!
//! # Wire Format
//!
//! Events are serialized with a `type` tag:
//!
//! ```json
//! { "type": "section_changed", "index": 3 }
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::{Intent, PlaybackStatus};

/// Events a UI layer may want to react to (announcements, haptics, progress).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NarratorEvent {
    // ========== Playback Events ==========
    /// A content unit started speaking.
    PlaybackStarted {
        /// Index of the unit.
        index: usize,
    },

    /// The current unit index changed (advance or seek).
    SectionChanged {
        /// New index.
        index: usize,
    },

    /// A unit finished and playback stopped at a single/repeat boundary.
    SectionCompleted {
        /// Index of the finished unit.
        index: usize,
    },

    /// The last unit finished; the sequence is complete.
    PlaybackDone,

    /// The session status changed.
    PlaybackStatus {
        /// New status.
        status: PlaybackStatus,
    },

    /// A settings preview utterance finished.
    SampleFinished,

    /// Playback failed after exhausting retries.
    PlaybackError {
        /// Error description.
        message: String,
    },

    // ========== Command Events ==========
    /// A spoken command was resolved and its handler invoked.
    CommandDispatched {
        /// The recognised utterance.
        utterance: String,
        /// The intent that was invoked, if any (`None` for raw-text handling).
        intent: Option<Intent>,
    },

    /// A spoken command matched no handler.
    CommandNotUnderstood {
        /// The recognised utterance.
        utterance: String,
    },
}

impl NarratorEvent {
    /// Whether the event reports a failure.
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::PlaybackError { .. })
    }
}
