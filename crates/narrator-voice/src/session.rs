//! Mutable state of one playback session.
//!
//! Every asynchronous completion (engine callback, pause timer, retry timer)
//! carries the [`Generation`] that was current when it was issued. Before it
//! may touch the session it must match the generation recorded in
//! [`PendingOp`]; anything else is a stale completion and is discarded.

use std::time::Duration;

use narrator_core::{ContentUnit, PauseDurations, PlayMode, PlaybackStatus, VoiceParams};
use tokio::task::JoinHandle;

/// Monotonic token used to invalidate in-flight completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub const fn value(self) -> u64 {
        self.0
    }
}

/// What an in-flight `speak` call is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SpeakTarget {
    /// The content unit at this index.
    Unit(usize),
    /// A one-off settings preview, and the status to settle in afterwards.
    Sample { text: String, then: PlaybackStatus },
}

/// The single asynchronous operation the session is waiting on.
#[derive(Debug, Default)]
pub(crate) enum PendingOp {
    #[default]
    None,

    /// Waiting for the engine's terminal event.
    Speaking {
        generation: Generation,
        attempt: u32,
        target: SpeakTarget,
    },

    /// Waiting out the pause after a unit.
    Advance {
        generation: Generation,
        timer: JoinHandle<()>,
    },

    /// Waiting out the back-off before retrying a failed utterance.
    Retry {
        generation: Generation,
        target: SpeakTarget,
        timer: JoinHandle<()>,
    },
}

impl PendingOp {
    pub(crate) const fn generation(&self) -> Option<Generation> {
        match self {
            Self::None => None,
            Self::Speaking { generation, .. }
            | Self::Advance { generation, .. }
            | Self::Retry { generation, .. } => Some(*generation),
        }
    }

    /// The utterance being spoken or retried, if any.
    pub(crate) const fn target(&self) -> Option<&SpeakTarget> {
        match self {
            Self::Speaking { target, .. } | Self::Retry { target, .. } => Some(target),
            Self::None | Self::Advance { .. } => None,
        }
    }
}

/// The state owned by a [`PlaybackController`](crate::PlaybackController).
#[derive(Debug)]
pub(crate) struct Session {
    pub units: Vec<ContentUnit>,
    pub index: usize,
    pub mode: PlayMode,
    pub repeat_target: u32,
    pub repeat_count: u32,
    pub params: VoiceParams,
    pub pauses: PauseDurations,
    pub status: PlaybackStatus,
    pub generation: Generation,
    pub pending: PendingOp,
    /// Whether `Done` has been signalled since the last initialise or seek.
    pub done_emitted: bool,
}

impl Session {
    /// An empty session that refuses to play.
    pub fn empty(generation: Generation) -> Self {
        Self {
            units: Vec::new(),
            index: 0,
            mode: PlayMode::default(),
            repeat_target: 2,
            repeat_count: 0,
            params: VoiceParams::default(),
            pauses: PauseDurations::default(),
            status: PlaybackStatus::Idle,
            generation,
            pending: PendingOp::None,
            done_emitted: false,
        }
    }

    /// Invalidate every outstanding completion and return the new token.
    pub fn bump(&mut self) -> Generation {
        self.generation = self.generation.next();
        self.generation
    }

    /// Drop the pending operation, aborting its timer if it has one.
    pub fn clear_pending(&mut self) {
        match std::mem::take(&mut self.pending) {
            PendingOp::Advance { timer, .. } | PendingOp::Retry { timer, .. } => timer.abort(),
            PendingOp::Speaking { .. } | PendingOp::None => {}
        }
    }

    fn is_current(&self, generation: Generation) -> bool {
        generation == self.generation && self.pending.generation() == Some(generation)
    }

    /// Take an in-flight `speak` issued under `generation`.
    pub fn take_speaking(&mut self, generation: Generation) -> Option<(u32, SpeakTarget)> {
        if !self.is_current(generation) || !matches!(self.pending, PendingOp::Speaking { .. }) {
            return None;
        }
        match std::mem::take(&mut self.pending) {
            PendingOp::Speaking {
                attempt, target, ..
            } => Some((attempt, target)),
            _ => None,
        }
    }

    /// Take a pause timer armed under `generation`.
    ///
    /// Called from the timer task itself, so the handle is dropped rather
    /// than aborted.
    pub fn take_advance(&mut self, generation: Generation) -> bool {
        if self.is_current(generation) && matches!(self.pending, PendingOp::Advance { .. }) {
            self.pending = PendingOp::None;
            true
        } else {
            false
        }
    }

    /// Take a retry timer armed under `generation`.
    pub fn take_retry(&mut self, generation: Generation) -> bool {
        if self.is_current(generation) && matches!(self.pending, PendingOp::Retry { .. }) {
            self.pending = PendingOp::None;
            true
        } else {
            false
        }
    }

    pub fn current_unit(&self) -> Option<&ContentUnit> {
        self.units.get(self.index)
    }

    pub fn has_content(&self) -> bool {
        !self.units.is_empty()
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.units.len()
    }

    /// Move to `index`; repeat progress belongs to the old unit.
    pub const fn set_index(&mut self, index: usize) {
        self.index = index;
        self.repeat_count = 0;
    }

    pub const fn set_mode(&mut self, mode: PlayMode) {
        self.mode = mode;
        self.repeat_count = 0;
    }

    /// Pause after the current unit at the current rate.
    pub fn pause_after_current(&self) -> Duration {
        self.current_unit()
            .map_or(Duration::ZERO, |unit| {
                self.pauses.pause_after(unit.kind, self.params.rate)
            })
    }
}
