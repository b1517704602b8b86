//! CLI bootstrap - the composition root.
//!
//! Settings are resolved once here and the console synthesiser is created;
//! handlers receive the composed [`CliContext`] and build the narration
//! components they need from it.

use std::sync::Arc;

use narrator_core::NarrationSettings;
use narrator_voice::{PlaybackController, PlaybackEvent, RetryPolicy};
use tokio::sync::mpsc;
use tracing::debug;

use crate::adapters::ConsoleSynth;
use crate::config::resolve_settings;
use crate::error::CliError;
use crate::parser::Cli;

/// Fully composed context for CLI commands.
pub struct CliContext {
    settings: NarrationSettings,
    synth: Arc<ConsoleSynth>,
}

impl CliContext {
    /// Effective settings after file, environment and flag overrides.
    pub const fn settings(&self) -> &NarrationSettings {
        &self.settings
    }

    pub fn synth(&self) -> Arc<ConsoleSynth> {
        Arc::clone(&self.synth)
    }

    /// A playback controller on the console synthesiser, retrying as configured.
    pub fn player(&self) -> (PlaybackController, mpsc::UnboundedReceiver<PlaybackEvent>) {
        let (player, events) = PlaybackController::new(self.synth());
        let retry = RetryPolicy::with_max_retries(self.settings.synthesis_max_retries);
        (player.with_retry_policy(retry), events)
    }
}

/// Resolve settings and wire the console adapters.
///
/// # Errors
///
/// Returns an error if the settings file cannot be read or the merged
/// settings are out of range.
pub fn bootstrap(cli: &Cli) -> Result<CliContext, CliError> {
    let settings = resolve_settings(cli)?;
    debug!(
        language = %settings.language,
        rate = settings.rate,
        mode = %settings.play_mode,
        "Settings resolved"
    );
    Ok(CliContext {
        settings,
        synth: Arc::new(ConsoleSynth::new()),
    })
}
