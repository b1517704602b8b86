//! Voices command handler.

use anyhow::Result;
use narrator_core::{SynthesisPort, VoiceQuality};

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::{print_separator, truncate_string};

/// List the voices the synthesiser offers, optionally for one language.
///
/// The configured voice is marked with `*`.
pub async fn execute(ctx: &CliContext, language: Option<&str>) -> Result<()> {
    let voices = ctx
        .synth()
        .list_voices()
        .await
        .map_err(|e| CliError::Voice(e.to_string()))?;
    let voices: Vec<_> = voices
        .into_iter()
        .filter(|v| language.is_none_or(|lang| v.speaks(lang)))
        .collect();

    if voices.is_empty() {
        match language {
            Some(lang) => println!("No voices found for '{lang}'."),
            None => println!("No voices found."),
        }
        return Ok(());
    }

    let selected = ctx.settings().voice_id.as_deref();
    println!("{:<2} {:<20} {:<24} {:<8} Quality", "", "ID", "Name", "Language");
    print_separator(66);
    for voice in voices {
        let marker = if selected == Some(voice.id.as_str()) { "*" } else { "" };
        let quality = match voice.quality {
            VoiceQuality::Enhanced => "enhanced",
            VoiceQuality::Default => "default",
        };
        println!(
            "{:<2} {:<20} {:<24} {:<8} {}",
            marker,
            truncate_string(&voice.id, 19),
            truncate_string(&voice.name, 23),
            voice.language,
            quality
        );
    }
    Ok(())
}
