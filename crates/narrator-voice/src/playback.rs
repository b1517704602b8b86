//! Playback controller.
//!
//! Sequences content units through a [`SynthesisPort`] according to the
//! active [`PlayMode`]:
//!
//! ```text
//!   Idle ──play──► Playing ──finish──► (pause) ──► advance
//!                   │   ▲                          ├─ Single      → Idle
//!             pause │   │ resume                   ├─ Repeat      → replay / next
//!                   ▼   │                          └─ Continuous  → next / Done
//!                  Paused
//! ```
//!
//! All state lives behind one mutex that is never held across an `.await`.
//! Engine completions, pause timers and retry timers run as spawned tasks
//! that call back into the controller with the [`Generation`] they were issued
//! under; user actions bump the generation, so late completions from a
//! superseded utterance are dropped instead of advancing playback.
//!
//! The controller spawns tasks and must be driven from inside a Tokio runtime.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use narrator_core::settings::{
    validate_pitch, validate_rate, validate_repeat_target, validate_volume,
};
use narrator_core::{
    ContentUnit, NarrationSettings, PauseDurations, PlayMode, PlaybackStatus, SynthesisError,
    SynthesisPort, VoiceParams,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use crate::error::VoiceError;
use crate::params::{self, RetryPolicy};
use crate::session::{Generation, PendingOp, Session, SpeakTarget};

/// Events emitted by the playback controller.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// The session status changed.
    StatusChanged(PlaybackStatus),
    /// A unit was handed to the engine (not re-emitted for retries).
    Started { index: usize },
    /// The current index moved.
    SectionChanged { index: usize },
    /// A unit finished for good in single or repeat mode.
    SectionComplete { index: usize },
    /// Continuous or repeat playback ran off the last unit.
    Done,
    /// A settings preview finished speaking.
    SampleFinished,
    /// Synthesis failed after exhausting retries.
    Error(VoiceError),
}

/// Everything a session needs besides its units.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackOptions {
    pub params: VoiceParams,
    pub mode: PlayMode,
    pub repeat_target: u32,
    pub pauses: PauseDurations,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self::from(&NarrationSettings::default())
    }
}

impl From<&NarrationSettings> for PlaybackOptions {
    fn from(settings: &NarrationSettings) -> Self {
        Self {
            params: settings.voice_params(),
            mode: settings.play_mode,
            repeat_target: settings.repeat_target,
            pauses: settings.pauses,
        }
    }
}

/// Point-in-time view of the session.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSnapshot {
    pub status: PlaybackStatus,
    pub index: usize,
    pub len: usize,
    pub mode: PlayMode,
    pub repeat_count: u32,
    pub repeat_target: u32,
    pub params: VoiceParams,
    pub generation: Generation,
}

/// Drives narration of a list of content units.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct PlaybackController {
    session: Arc<Mutex<Session>>,
    port: Arc<dyn SynthesisPort>,
    event_tx: mpsc::UnboundedSender<PlaybackEvent>,
    retry: RetryPolicy,
}

impl PlaybackController {
    /// Create a controller and the receiver for its events.
    pub fn new(port: Arc<dyn SynthesisPort>) -> (Self, mpsc::UnboundedReceiver<PlaybackEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let controller = Self {
            session: Arc::new(Mutex::new(Session::empty(Generation::default()))),
            port,
            event_tx,
            retry: RetryPolicy::default(),
        };
        (controller, event_rx)
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    // ── Session lifecycle ──────────────────────────────────────────

    /// Replace the session with `units`, starting at `start_index`.
    ///
    /// An out-of-range start index is clamped to the last unit. Any in-flight
    /// utterance is cancelled and the engine defaults are pushed to the port.
    pub fn initialize(&self, units: Vec<ContentUnit>, start_index: usize, options: PlaybackOptions) {
        let mut s = self.lock();
        let prior = s.status;
        self.halt(&mut s);

        let mut fresh = Session::empty(s.generation);
        fresh.index = start_index.min(units.len().saturating_sub(1));
        if fresh.index != start_index && !units.is_empty() {
            warn!(
                requested = start_index,
                clamped = fresh.index,
                "Start index out of range, clamping"
            );
        }
        fresh.units = units;
        fresh.mode = options.mode;
        fresh.repeat_target = options.repeat_target.max(1);
        fresh.params = options.params;
        fresh.pauses = options.pauses;
        *s = fresh;

        params::apply_engine_defaults(self.port.as_ref(), &s.params);

        if s.has_content() {
            info!(
                units = s.units.len(),
                start = s.index,
                mode = %s.mode,
                "Playback session initialised"
            );
        } else {
            warn!("Playback session initialised without content; play is disabled");
        }

        if prior != PlaybackStatus::Idle {
            self.emit(PlaybackEvent::StatusChanged(PlaybackStatus::Idle));
        }
    }

    /// Tear the session down to an empty, idle state.
    pub fn cleanup(&self) {
        let mut s = self.lock();
        let prior = s.status;
        self.halt(&mut s);
        let generation = s.generation;
        *s = Session::empty(generation);
        if prior != PlaybackStatus::Idle {
            self.emit(PlaybackEvent::StatusChanged(PlaybackStatus::Idle));
        }
        info!("Playback session cleaned up");
    }

    // ── Transport ──────────────────────────────────────────────────

    /// Speak the current unit. No-op while already playing.
    pub fn play(&self) -> Result<(), VoiceError> {
        let mut s = self.lock();
        self.ensure_playable(&s)?;
        if s.index >= s.units.len() {
            return Err(VoiceError::InvalidIndex {
                index: s.index,
                len: s.units.len(),
            });
        }
        if s.status == PlaybackStatus::Playing {
            debug!("play ignored: already playing");
            return Ok(());
        }
        self.speak_current(&mut s, 0);
        Ok(())
    }

    /// Halt the engine and keep the current index. Only valid while playing.
    pub fn pause(&self) {
        let mut s = self.lock();
        if s.status != PlaybackStatus::Playing {
            debug!(status = %s.status.as_str(), "pause ignored: not playing");
            return;
        }
        self.halt(&mut s);
        self.set_status(&mut s, PlaybackStatus::Paused);
    }

    /// Restart the current unit from its beginning. Only valid while paused.
    pub fn resume(&self) -> Result<(), VoiceError> {
        let mut s = self.lock();
        if s.status != PlaybackStatus::Paused {
            debug!(status = %s.status.as_str(), "resume ignored: not paused");
            return Ok(());
        }
        self.ensure_playable(&s)?;
        self.speak_current(&mut s, 0);
        Ok(())
    }

    /// Pause when playing, otherwise resume or start.
    pub fn toggle(&self) -> Result<(), VoiceError> {
        match self.status() {
            PlaybackStatus::Playing => {
                self.pause();
                Ok(())
            }
            PlaybackStatus::Paused => self.resume(),
            PlaybackStatus::Idle | PlaybackStatus::Stopped => self.play(),
        }
    }

    pub fn stop(&self) {
        let mut s = self.lock();
        self.halt(&mut s);
        self.set_status(&mut s, PlaybackStatus::Stopped);
    }

    /// Seek to `index`, optionally starting playback there.
    pub fn go_to_section(&self, index: usize, autoplay: bool) -> Result<(), VoiceError> {
        let mut s = self.lock();
        self.seek(&mut s, index, autoplay)
    }

    /// Seek forward one unit and play. No-op on the last unit.
    pub fn next(&self) -> Result<(), VoiceError> {
        let mut s = self.lock();
        if !s.has_content() {
            return Err(VoiceError::EngineNotReady);
        }
        if s.is_last() {
            debug!(index = s.index, "next ignored: already at last unit");
            return Ok(());
        }
        let index = s.index + 1;
        self.seek(&mut s, index, true)
    }

    /// Seek back one unit and play. No-op on the first unit.
    pub fn previous(&self) -> Result<(), VoiceError> {
        let mut s = self.lock();
        if !s.has_content() {
            return Err(VoiceError::EngineNotReady);
        }
        if s.index == 0 {
            debug!("previous ignored: already at first unit");
            return Ok(());
        }
        let index = s.index - 1;
        self.seek(&mut s, index, true)
    }

    /// Speak a one-off preview outside the unit sequence.
    pub fn speak_sample(&self, text: impl Into<String>) -> Result<(), VoiceError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Ok(());
        }
        if !self.port.is_ready() {
            warn!("Sample requested before the synthesiser is ready");
            return Err(VoiceError::EngineNotReady);
        }
        let mut s = self.lock();
        // An interrupted unit resumes from paused; a replaced sample keeps
        // the status it would have restored.
        let then = match s.pending.target() {
            Some(SpeakTarget::Sample { then, .. }) => *then,
            _ => match s.status {
                PlaybackStatus::Playing | PlaybackStatus::Paused => PlaybackStatus::Paused,
                other => other,
            },
        };
        self.halt(&mut s);
        self.launch(&mut s, SpeakTarget::Sample { text: text.clone(), then }, text, 0);
        Ok(())
    }

    // ── Voice parameters ───────────────────────────────────────────

    pub fn set_rate(&self, rate: f32) -> Result<(), VoiceError> {
        validate_rate(rate)?;
        self.reconfigure(|p, port| {
            p.rate = rate;
            port.set_default_rate(params::engine_rate(rate));
            port.set_default_pitch(params::engine_pitch(rate, p.pitch));
        });
        Ok(())
    }

    pub fn set_pitch(&self, pitch: f32) -> Result<(), VoiceError> {
        validate_pitch(pitch)?;
        self.reconfigure(|p, port| {
            p.pitch = pitch;
            port.set_default_pitch(params::engine_pitch(p.rate, pitch));
        });
        Ok(())
    }

    pub fn set_volume(&self, volume: f32) -> Result<(), VoiceError> {
        validate_volume(volume)?;
        self.reconfigure(|p, _| p.volume = volume);
        Ok(())
    }

    pub fn set_voice(&self, voice_id: impl Into<String>) {
        let voice_id = voice_id.into();
        self.reconfigure(|p, port| {
            port.set_default_voice(&voice_id);
            p.voice_id = Some(voice_id);
        });
    }

    pub fn set_play_mode(&self, mode: PlayMode) {
        let mut s = self.lock();
        if s.mode != mode {
            info!(from = %s.mode, to = %mode, "Play mode changed");
            s.set_mode(mode);
        }
    }

    pub fn set_repeat_target(&self, target: u32) -> Result<(), VoiceError> {
        validate_repeat_target(target)?;
        self.lock().repeat_target = target;
        Ok(())
    }

    // ── Accessors ──────────────────────────────────────────────────

    pub fn status(&self) -> PlaybackStatus {
        self.lock().status
    }

    pub fn current_index(&self) -> usize {
        self.lock().index
    }

    pub fn is_playing(&self) -> bool {
        self.status() == PlaybackStatus::Playing
    }

    pub fn play_mode(&self) -> PlayMode {
        self.lock().mode
    }

    pub fn repeat_count(&self) -> u32 {
        self.lock().repeat_count
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let s = self.lock();
        PlaybackSnapshot {
            status: s.status,
            index: s.index,
            len: s.units.len(),
            mode: s.mode,
            repeat_count: s.repeat_count,
            repeat_target: s.repeat_target,
            params: s.params.clone(),
            generation: s.generation,
        }
    }

    // ── Internals ──────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: PlaybackEvent) {
        if self.event_tx.send(event).is_err() {
            trace!("Playback event receiver dropped");
        }
    }

    fn set_status(&self, s: &mut Session, status: PlaybackStatus) {
        if s.status != status {
            debug!(from = %s.status.as_str(), to = %status.as_str(), "Playback status");
            s.status = status;
            self.emit(PlaybackEvent::StatusChanged(status));
        }
    }

    fn ensure_playable(&self, s: &Session) -> Result<(), VoiceError> {
        if !s.has_content() {
            warn!("Nothing to play: session has no content");
            return Err(VoiceError::EngineNotReady);
        }
        if !self.port.is_ready() {
            warn!("Synthesiser not ready");
            return Err(VoiceError::EngineNotReady);
        }
        Ok(())
    }

    /// Cancel whatever is in flight without touching the status.
    fn halt(&self, s: &mut Session) {
        s.clear_pending();
        s.bump();
        self.port.stop();
    }

    fn seek(&self, s: &mut Session, index: usize, autoplay: bool) -> Result<(), VoiceError> {
        if !s.has_content() {
            return Err(VoiceError::EngineNotReady);
        }
        if index >= s.units.len() {
            warn!(index, len = s.units.len(), "Seek out of range");
            return Err(VoiceError::InvalidIndex {
                index,
                len: s.units.len(),
            });
        }
        self.halt(s);
        self.set_status(s, PlaybackStatus::Stopped);
        s.set_index(index);
        s.done_emitted = false;
        self.emit(PlaybackEvent::SectionChanged { index });

        if autoplay {
            if !self.port.is_ready() {
                warn!("Synthesiser not ready");
                return Err(VoiceError::EngineNotReady);
            }
            self.speak_current(s, 0);
        }
        Ok(())
    }

    /// Apply a parameter change, replaying the current unit if it was playing.
    fn reconfigure(&self, apply: impl FnOnce(&mut VoiceParams, &dyn SynthesisPort)) {
        let mut s = self.lock();
        let prior = s.status;
        self.halt(&mut s);
        apply(&mut s.params, self.port.as_ref());

        match prior {
            PlaybackStatus::Playing if s.has_content() => self.speak_current(&mut s, 0),
            PlaybackStatus::Paused => {}
            _ => self.set_status(&mut s, PlaybackStatus::Idle),
        }
    }

    fn speak_current(&self, s: &mut Session, attempt: u32) {
        let Some(unit) = s.current_unit() else {
            return;
        };
        let text = unit.text.clone();
        let index = s.index;
        self.launch(s, SpeakTarget::Unit(index), text, attempt);
    }

    fn launch(&self, s: &mut Session, target: SpeakTarget, text: String, attempt: u32) {
        s.clear_pending();
        let generation = s.bump();
        let speak_params = params::speak_params(&s.params);

        s.pending = PendingOp::Speaking {
            generation,
            attempt,
            target: target.clone(),
        };
        self.set_status(s, PlaybackStatus::Playing);
        if let (0, SpeakTarget::Unit(index)) = (attempt, &target) {
            debug!(index = *index, generation = generation.value(), "Speaking unit");
            self.emit(PlaybackEvent::Started { index: *index });
        }

        let this = self.clone();
        tokio::spawn(async move {
            let outcome = this.port.speak(&text, &speak_params).await;
            this.on_speak_outcome(generation, outcome);
        });
    }

    fn on_speak_outcome(&self, generation: Generation, outcome: Result<(), SynthesisError>) {
        let mut s = self.lock();
        let Some((attempt, target)) = s.take_speaking(generation) else {
            trace!(generation = generation.value(), "Discarding stale synthesis completion");
            return;
        };
        match outcome {
            Ok(()) => self.on_finished(&mut s, generation, target),
            Err(err) => self.on_failed(&mut s, generation, attempt, target, &err),
        }
    }

    fn on_finished(&self, s: &mut Session, generation: Generation, target: SpeakTarget) {
        let index = match target {
            SpeakTarget::Unit(index) => index,
            SpeakTarget::Sample { then, .. } => {
                self.set_status(s, then);
                self.emit(PlaybackEvent::SampleFinished);
                return;
            }
        };

        let pause = s.pause_after_current();
        trace!(index, pause_ms = pause.as_millis(), "Unit finished");
        if pause.is_zero() {
            self.advance(s);
            return;
        }

        let this = self.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(pause).await;
            this.on_advance_due(generation);
        });
        s.pending = PendingOp::Advance { generation, timer };
    }

    fn on_advance_due(&self, generation: Generation) {
        let mut s = self.lock();
        if !s.take_advance(generation) {
            trace!(generation = generation.value(), "Discarding stale pause timer");
            return;
        }
        self.advance(&mut s);
    }

    fn advance(&self, s: &mut Session) {
        let index = s.index;
        match s.mode {
            PlayMode::Single => {
                self.set_status(s, PlaybackStatus::Idle);
                self.emit(PlaybackEvent::SectionComplete { index });
            }
            PlayMode::Repeat => {
                s.repeat_count += 1;
                if s.repeat_count < s.repeat_target {
                    debug!(
                        index,
                        repeat = s.repeat_count,
                        target = s.repeat_target,
                        "Repeating unit"
                    );
                    self.speak_current(s, 0);
                } else {
                    s.repeat_count = 0;
                    self.emit(PlaybackEvent::SectionComplete { index });
                    self.move_next(s);
                }
            }
            PlayMode::Continuous => self.move_next(s),
        }
    }

    fn move_next(&self, s: &mut Session) {
        if s.is_last() {
            self.set_status(s, PlaybackStatus::Idle);
            if !s.done_emitted {
                s.done_emitted = true;
                info!(units = s.units.len(), "Reached end of content");
                self.emit(PlaybackEvent::Done);
            }
            return;
        }
        let index = s.index + 1;
        s.set_index(index);
        self.emit(PlaybackEvent::SectionChanged { index });
        self.speak_current(s, 0);
    }

    fn on_failed(
        &self,
        s: &mut Session,
        generation: Generation,
        attempt: u32,
        target: SpeakTarget,
        err: &SynthesisError,
    ) {
        if attempt >= self.retry.max_retries {
            let attempts = attempt + 1;
            error!(error = %err, attempts, "Synthesis failed, giving up");
            let settle = match target {
                SpeakTarget::Sample { then, .. } => then,
                SpeakTarget::Unit(_) => PlaybackStatus::Idle,
            };
            self.set_status(s, settle);
            self.emit(PlaybackEvent::Error(VoiceError::SynthesisFailure {
                attempts,
                message: err.to_string(),
            }));
            return;
        }

        let next_attempt = attempt + 1;
        let delay = self.retry.backoff(next_attempt);
        warn!(
            error = %err,
            attempt = next_attempt,
            delay_ms = delay.as_millis(),
            "Synthesis failed, retrying"
        );

        let language = s.params.language.clone();
        let current_voice = s.params.voice_id.clone();
        let retry_target = target.clone();
        let this = self.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let fallback = this.fallback_voice(&language, current_voice.as_deref()).await;
            this.on_retry_due(generation, next_attempt, retry_target, fallback);
        });
        s.pending = PendingOp::Retry {
            generation,
            target,
            timer,
        };
    }

    async fn fallback_voice(&self, language: &str, current: Option<&str>) -> Option<String> {
        match self.port.list_voices().await {
            Ok(voices) => {
                params::pick_fallback_voice(&voices, language, current).map(|v| v.id.clone())
            }
            Err(err) => {
                warn!(error = %err, "Could not list voices for fallback");
                None
            }
        }
    }

    fn on_retry_due(
        &self,
        generation: Generation,
        attempt: u32,
        target: SpeakTarget,
        fallback: Option<String>,
    ) {
        let mut s = self.lock();
        if !s.take_retry(generation) {
            trace!(generation = generation.value(), "Discarding stale retry");
            return;
        }
        if let Some(voice_id) = fallback {
            info!(voice = %voice_id, "Switching to fallback voice");
            self.port.set_default_voice(&voice_id);
            s.params.voice_id = Some(voice_id);
        }
        match target {
            SpeakTarget::Unit(_) => self.speak_current(&mut s, attempt),
            SpeakTarget::Sample { text, then } => {
                let target = SpeakTarget::Sample {
                    text: text.clone(),
                    then,
                };
                self.launch(&mut s, target, text, attempt);
            }
        }
    }
}
