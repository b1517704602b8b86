//! Accumulates recognition results into committed utterances.

use crate::text_utils::{join_transcript, normalize};

/// A freshly committed utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    /// The text that was just committed.
    pub utterance: String,
    /// Everything committed in this session, including `utterance`.
    pub transcript: String,
}

/// Buffer behind continuous dictation.
///
/// Finals are appended to the transcript; interims are only previewed. A
/// final that repeats the previous commit (after normalisation) is dropped,
/// since some engines re-deliver the last result after a restart.
#[derive(Debug, Clone, Default)]
pub struct TranscriptBuffer {
    committed: String,
    interim: String,
    last_committed: Option<String>,
}

impl TranscriptBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an interim result and return the preview text.
    pub fn set_interim(&mut self, text: &str) -> String {
        text.trim().clone_into(&mut self.interim);
        self.preview()
    }

    /// Transcript so far plus the pending interim text.
    pub fn preview(&self) -> String {
        join_transcript(&self.committed, &self.interim)
    }

    pub fn has_interim(&self) -> bool {
        !self.interim.is_empty()
    }

    pub fn transcript(&self) -> &str {
        &self.committed
    }

    /// Commit a final result. Returns `None` for empty or duplicate text.
    pub fn commit(&mut self, text: &str) -> Option<Committed> {
        self.interim.clear();
        let utterance = text.trim();
        let key = normalize(utterance);
        if key.is_empty() || self.last_committed.as_deref() == Some(key.as_str()) {
            return None;
        }
        self.committed = join_transcript(&self.committed, utterance);
        self.last_committed = Some(key);
        Some(Committed {
            utterance: utterance.to_string(),
            transcript: self.committed.clone(),
        })
    }

    /// Promote the pending interim text to a commit.
    pub fn commit_interim(&mut self) -> Option<Committed> {
        let interim = std::mem::take(&mut self.interim);
        self.commit(&interim)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
