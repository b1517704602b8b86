//! Forwards playback events to a [`NarratorEventEmitter`].

use std::sync::Arc;

use narrator_core::{NarratorEvent, NarratorEventEmitter};
use tokio::sync::mpsc;

use crate::playback::PlaybackEvent;

impl From<PlaybackEvent> for NarratorEvent {
    fn from(event: PlaybackEvent) -> Self {
        match event {
            PlaybackEvent::StatusChanged(status) => Self::PlaybackStatus { status },
            PlaybackEvent::Started { index } => Self::PlaybackStarted { index },
            PlaybackEvent::SectionChanged { index } => Self::SectionChanged { index },
            PlaybackEvent::SectionComplete { index } => Self::SectionCompleted { index },
            PlaybackEvent::Done => Self::PlaybackDone,
            PlaybackEvent::SampleFinished => Self::SampleFinished,
            PlaybackEvent::Error(err) => Self::PlaybackError {
                message: err.to_string(),
            },
        }
    }
}

/// Bridge `PlaybackEvent` → `NarratorEvent`, forwarding each event to `emitter`.
///
/// The spawned task ends when every [`PlaybackController`](crate::PlaybackController)
/// clone has been dropped.
pub fn spawn_event_bridge(
    mut event_rx: mpsc::UnboundedReceiver<PlaybackEvent>,
    emitter: Arc<dyn NarratorEventEmitter>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            emitter.emit(event.into());
        }
    })
}
