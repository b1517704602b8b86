//! Classify command handler.
//!
//! Shows which intent a phrase resolves to, for tuning command phrasing
//! without a microphone.

use anyhow::Result;
use narrator_voice::{IntentClassifier, KeywordClassifier};

use crate::bootstrap::CliContext;

/// Execute the classify command.
pub fn execute(ctx: &CliContext, text: &str) -> Result<()> {
    let classifier = KeywordClassifier::for_language(&ctx.settings().language);
    match classifier.classify(text) {
        Some(intent) => println!("{}", intent.as_str()),
        None => println!("(not a command)"),
    }
    Ok(())
}
