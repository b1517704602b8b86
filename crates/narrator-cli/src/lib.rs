//! Terminal front-end for narrator.
//!
//! The CLI stands in for a device: [`adapters::ConsoleSynth`] "speaks" by
//! printing at reading pace and [`adapters::LineRecognizer`] treats typed
//! lines as recognised speech, so chapters can be narrated and steered with
//! voice commands from a terminal.

#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tokio_test as _;

// Used by the binary only
use dotenvy as _;
use tracing_subscriber as _;

pub mod adapters;
pub mod bootstrap;
pub mod commands;
pub mod config;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

// Re-export primary types for convenient access
pub use bootstrap::{CliContext, bootstrap};
pub use commands::Commands;
pub use error::CliError;
pub use parser::Cli;
