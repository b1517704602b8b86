//! One-line descriptions of narrator events and listen outcomes.

use narrator_core::{NarratorEvent, PlaybackStatus};
use narrator_voice::{CaptureOutcome, ListenOutcome};

/// The line to print for `event`, if it is worth showing.
pub fn describe_event(event: &NarratorEvent) -> Option<String> {
    match event {
        NarratorEvent::PlaybackStarted { index } => Some(format!("[section {}]", index + 1)),
        NarratorEvent::SectionCompleted { index } => {
            Some(format!("[section {} complete]", index + 1))
        }
        NarratorEvent::PlaybackDone => Some("[end of chapter]".to_string()),
        NarratorEvent::PlaybackStatus { status } => match status {
            PlaybackStatus::Paused => Some("[paused]".to_string()),
            PlaybackStatus::Stopped => Some("[stopped]".to_string()),
            PlaybackStatus::Idle | PlaybackStatus::Playing => None,
        },
        NarratorEvent::PlaybackError { message } => Some(format!("Narration stopped: {message}")),
        NarratorEvent::CommandDispatched { utterance, intent } => Some(match intent {
            Some(intent) => format!("> {utterance} ({})", intent.as_str()),
            None => format!("> {utterance}"),
        }),
        NarratorEvent::CommandNotUnderstood { utterance } => {
            Some(format!("> {utterance} (not a command here)"))
        }
        NarratorEvent::SectionChanged { .. } | NarratorEvent::SampleFinished => None,
    }
}

/// The line to print after a capture, if the router did not already report it.
pub fn describe_listen(outcome: &ListenOutcome) -> Option<String> {
    match outcome {
        ListenOutcome::NothingHeard(CaptureOutcome::TimedOut) => {
            Some("(no command heard)".to_string())
        }
        ListenOutcome::Dispatched { .. } | ListenOutcome::NothingHeard(_) => None,
    }
}
