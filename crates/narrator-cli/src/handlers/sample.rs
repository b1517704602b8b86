//! Sample command handler.
//!
//! Speaks a preview with the effective voice settings, as a settings screen
//! would when the student adjusts rate or pitch.

use anyhow::Result;
use narrator_voice::{PlaybackEvent, PlaybackOptions};

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Execute the sample command and wait for the preview to finish.
pub async fn execute(ctx: &CliContext, text: &str) -> Result<()> {
    let (player, mut events) = ctx.player();
    player.initialize(Vec::new(), 0, PlaybackOptions::from(ctx.settings()));
    player.speak_sample(text).map_err(CliError::from)?;
    if text.trim().is_empty() {
        return Ok(());
    }

    while let Some(event) = events.recv().await {
        match event {
            PlaybackEvent::SampleFinished => break,
            PlaybackEvent::Error(err) => return Err(CliError::from(err).into()),
            _ => {}
        }
    }
    Ok(())
}
