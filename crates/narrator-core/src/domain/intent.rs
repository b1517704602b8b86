//! Voice-command intents.

use serde::{Deserialize, Serialize};

/// A fixed command a screen can register a handler for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    PlayPause,
    Next,
    Prev,
    GoBack,
    OpenQuiz,
    OpenSettings,
    OpenLibrary,
    OpenQuestion,
}

impl Intent {
    /// Every intent, in classification priority order.
    pub const ALL: [Self; 8] = [
        Self::GoBack,
        Self::OpenQuestion,
        Self::OpenQuiz,
        Self::OpenSettings,
        Self::OpenLibrary,
        Self::Next,
        Self::Prev,
        Self::PlayPause,
    ];

    /// Stable snake_case label, as used on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlayPause => "play_pause",
            Self::Next => "next",
            Self::Prev => "prev",
            Self::GoBack => "go_back",
            Self::OpenQuiz => "open_quiz",
            Self::OpenSettings => "open_settings",
            Self::OpenLibrary => "open_library",
            Self::OpenQuestion => "open_question",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
