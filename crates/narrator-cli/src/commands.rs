//! Subcommands.

use std::path::PathBuf;

use clap::Subcommand;

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Narrate a chapter; typed lines act as spoken commands
    Read {
        /// Chapter JSON file
        chapter: PathBuf,
        /// Section to start from (0-based)
        #[arg(short, long, default_value = "0")]
        start: usize,
    },

    /// Speak a preview sentence with the current voice settings
    Sample {
        /// Text to speak
        text: String,
    },

    /// List synthesiser voices
    Voices {
        /// Only show voices for this language
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Show which command intent a phrase maps to
    Classify {
        /// Phrase to classify
        text: String,
    },
}
