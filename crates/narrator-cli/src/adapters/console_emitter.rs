//! Prints narrator events to the terminal.

use narrator_core::{NarratorEvent, NarratorEventEmitter};
use tokio::sync::Notify;

use crate::presentation::describe_event;

/// Emitter that writes each event on its own line and signals when
/// narration has run its course.
#[derive(Debug, Default)]
pub struct ConsoleEmitter {
    finished: Notify,
}

impl ConsoleEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves after the next `PlaybackDone` or `PlaybackError`.
    pub async fn finished(&self) {
        self.finished.notified().await;
    }
}

impl NarratorEventEmitter for ConsoleEmitter {
    fn emit(&self, event: NarratorEvent) {
        if let Some(line) = describe_event(&event) {
            if event.is_error() {
                eprintln!("{line}");
            } else {
                println!("{line}");
            }
        }
        if matches!(event, NarratorEvent::PlaybackDone) || event.is_error() {
            // Stored if nobody is waiting yet.
            self.finished.notify_one();
        }
    }
}
