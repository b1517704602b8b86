//! Command handlers.
//!
//! Handlers follow one pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<()>`
//! - Thin wrappers that parse CLI-specific input, drive the narration
//!   components and format output for the terminal.
//!
//! Playback sequencing and command resolution live in `narrator-voice`;
//! handlers only compose them.

pub mod classify;
pub mod read;
pub mod sample;
pub mod voices;
