//! Main CLI parser and top-level argument handling.
//!
//! Global narration options can also be set through `NARRATOR_*`
//! environment variables (a `.env` file is honoured). Precedence, lowest
//! first: built-in defaults, the `--settings` JSON file, environment, flags.

use std::path::PathBuf;

use clap::Parser;
use narrator_core::PlayMode;

use crate::commands::Commands;

/// Command-line interface for the narrator engine.
#[derive(Parser)]
#[command(name = "narrator")]
#[command(about = "Read study material aloud and steer it with voice commands")]
#[command(version)]
pub struct Cli {
    /// JSON settings file
    #[arg(long = "settings", env = "NARRATOR_SETTINGS", global = true)]
    pub settings: Option<PathBuf>,

    /// Language tag for speech and command phrases (e.g. ko-KR, en-US)
    #[arg(long, env = "NARRATOR_LANGUAGE", global = true)]
    pub language: Option<String>,

    /// Speech rate multiplier
    #[arg(long, env = "NARRATOR_RATE", global = true)]
    pub rate: Option<f32>,

    /// Pitch multiplier
    #[arg(long, env = "NARRATOR_PITCH", global = true)]
    pub pitch: Option<f32>,

    /// Output volume between 0 and 1
    #[arg(long, env = "NARRATOR_VOLUME", global = true)]
    pub volume: Option<f32>,

    /// Synthesiser voice id
    #[arg(long, env = "NARRATOR_VOICE", global = true)]
    pub voice: Option<String>,

    /// Play mode: single, continuous or repeat
    #[arg(long, env = "NARRATOR_PLAY_MODE", global = true)]
    pub mode: Option<PlayMode>,

    /// Times each section is read in repeat mode
    #[arg(long, env = "NARRATOR_REPEAT", global = true)]
    pub repeat: Option<u32>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
