//! Shared CLI presentation utilities.
//!
//! Format-only helpers for terminal output. Anything that decides *what*
//! happens belongs in the narration crates, not here.

pub mod events;
pub mod tables;

pub use events::{describe_event, describe_listen};
pub use tables::{print_separator, truncate_string};
