//! Standard voice-command bindings for narration screens.

use narrator_core::Intent;
use tracing::warn;

use crate::playback::PlaybackController;
use crate::router::ScreenHandlers;

/// Handlers for a player screen.
///
/// `PlayPause` toggles, `Next`/`Prev` move between units, and narration is
/// paused before a capture starts so the microphone does not hear it.
pub fn player_handlers(player: &PlaybackController) -> ScreenHandlers {
    let toggle = player.clone();
    let next = player.clone();
    let previous = player.clone();
    let pause = player.clone();

    ScreenHandlers::new()
        .on(Intent::PlayPause, move || {
            if let Err(err) = toggle.toggle() {
                warn!(error = %err, "Voice play/pause failed");
            }
        })
        .on(Intent::Next, move || {
            if let Err(err) = next.next() {
                warn!(error = %err, "Voice next failed");
            }
        })
        .on(Intent::Prev, move || {
            if let Err(err) = previous.previous() {
                warn!(error = %err, "Voice previous failed");
            }
        })
        .before_listen(move || pause.pause())
}
