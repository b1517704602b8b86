//! Event emitter trait for forwarding engine events to a UI layer.
//!
//! Implementations handle transport details (channels, bridges to a
//! platform UI thread, terminal output, etc.).

use crate::events::NarratorEvent;

/// Trait for emitting narrator events.
///
/// # Implementations
///
/// - `NoopEmitter` - For tests and headless contexts
/// - Adapter-specific implementations (console, mobile bridge, etc.)
pub trait NarratorEventEmitter: Send + Sync {
    /// Emit an event. Must not block.
    fn emit(&self, event: NarratorEvent);
}

/// A no-op event emitter that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    /// Create a new no-op emitter.
    pub const fn new() -> Self {
        Self
    }
}

impl NarratorEventEmitter for NoopEmitter {
    fn emit(&self, _event: NarratorEvent) {}
}
