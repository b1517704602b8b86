//! Settings domain types and validation.
//!
//! These are pure domain types with no infrastructure dependencies. Loading
//! and persisting settings is the adapter's job.

use std::ops::RangeInclusive;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{PauseDurations, PlayMode, VoiceParams};

/// Accepted speech-rate multipliers.
pub const RATE_RANGE: RangeInclusive<f32> = 0.1..=6.0;

/// Accepted pitch multipliers.
pub const PITCH_RANGE: RangeInclusive<f32> = 0.5..=2.0;

/// Accepted volume levels.
pub const VOLUME_RANGE: RangeInclusive<f32> = 0.0..=1.0;

/// Accepted repeat counts for repeat mode.
pub const REPEAT_TARGET_RANGE: RangeInclusive<u32> = 1..=10;

/// Upper bound on synthesis retries.
pub const MAX_SYNTHESIS_RETRIES: u32 = 5;

/// Narration and voice-command settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationSettings {
    /// BCP-47 language tag for synthesis and recognition.
    pub language: String,

    /// Speech-rate multiplier.
    pub rate: f32,

    /// Pitch multiplier.
    pub pitch: f32,

    /// Output volume.
    pub volume: f32,

    /// Preferred synthesiser voice.
    pub voice_id: Option<String>,

    /// Initial play mode.
    pub play_mode: PlayMode,

    /// How many times each unit is spoken in repeat mode.
    pub repeat_target: u32,

    /// Pauses after each kind of content unit.
    pub pauses: PauseDurations,

    /// Synthesis retries (with voice fallback) before an error is surfaced.
    pub synthesis_max_retries: u32,

    /// How long a single voice-command capture waits for a final result.
    pub capture_timeout_ms: u64,

    /// Silence after which dictation commits its interim text.
    pub silence_window_ms: u64,

    /// Consecutive engine restarts tolerated in continuous dictation.
    pub max_dictation_restarts: u32,

    /// Wall time after which the dictation buffer is reset.
    pub max_dictation_session_ms: u64,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            language: "ko-KR".to_string(),
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            voice_id: None,
            play_mode: PlayMode::Single,
            repeat_target: 2,
            pauses: PauseDurations::default(),
            synthesis_max_retries: 2,
            capture_timeout_ms: 6_000,
            silence_window_ms: 1_400,
            max_dictation_restarts: 5,
            max_dictation_session_ms: 8 * 60 * 1_000,
        }
    }
}

impl NarrationSettings {
    /// Voice parameters for a new playback session.
    pub fn voice_params(&self) -> VoiceParams {
        VoiceParams {
            rate: self.rate,
            pitch: self.pitch,
            volume: self.volume,
            voice_id: self.voice_id.clone(),
            language: self.language.clone(),
        }
    }

    pub const fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }

    pub const fn silence_window(&self) -> Duration {
        Duration::from_millis(self.silence_window_ms)
    }

    pub const fn max_dictation_session(&self) -> Duration {
        Duration::from_millis(self.max_dictation_session_ms)
    }

    /// Merge a partial update, only touching fields that are `Some`.
    pub fn merge(&mut self, other: &SettingsUpdate) {
        if let Some(ref language) = other.language {
            self.language.clone_from(language);
        }
        if let Some(rate) = other.rate {
            self.rate = rate;
        }
        if let Some(pitch) = other.pitch {
            self.pitch = pitch;
        }
        if let Some(volume) = other.volume {
            self.volume = volume;
        }
        if let Some(ref voice_id) = other.voice_id {
            self.voice_id.clone_from(voice_id);
        }
        if let Some(mode) = other.play_mode {
            self.play_mode = mode;
        }
        if let Some(target) = other.repeat_target {
            self.repeat_target = target;
        }
        if let Some(retries) = other.synthesis_max_retries {
            self.synthesis_max_retries = retries;
        }
        if let Some(ms) = other.capture_timeout_ms {
            self.capture_timeout_ms = ms;
        }
        if let Some(ms) = other.silence_window_ms {
            self.silence_window_ms = ms;
        }
        if let Some(restarts) = other.max_dictation_restarts {
            self.max_dictation_restarts = restarts;
        }
    }
}

/// Partial settings update.
///
/// `None` leaves a field unchanged. `voice_id` is doubly optional:
/// `Some(None)` clears the preferred voice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub language: Option<String>,
    pub rate: Option<f32>,
    pub pitch: Option<f32>,
    pub volume: Option<f32>,
    pub voice_id: Option<Option<String>>,
    pub play_mode: Option<PlayMode>,
    pub repeat_target: Option<u32>,
    pub synthesis_max_retries: Option<u32>,
    pub capture_timeout_ms: Option<u64>,
    pub silence_window_ms: Option<u64>,
    pub max_dictation_restarts: Option<u32>,
}

impl SettingsUpdate {
    /// Whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    #[error("Speech rate must be between 0.1 and 6.0, got {0}")]
    InvalidRate(f32),

    #[error("Pitch must be between 0.5 and 2.0, got {0}")]
    InvalidPitch(f32),

    #[error("Volume must be between 0.0 and 1.0, got {0}")]
    InvalidVolume(f32),

    #[error("Repeat count must be between 1 and 10, got {0}")]
    InvalidRepeatTarget(u32),

    #[error("Synthesis retries must be at most {MAX_SYNTHESIS_RETRIES}, got {0}")]
    InvalidRetryCount(u32),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("Language cannot be empty")]
    EmptyLanguage,
}

pub fn validate_rate(rate: f32) -> Result<(), SettingsError> {
    if RATE_RANGE.contains(&rate) {
        Ok(())
    } else {
        Err(SettingsError::InvalidRate(rate))
    }
}

pub fn validate_pitch(pitch: f32) -> Result<(), SettingsError> {
    if PITCH_RANGE.contains(&pitch) {
        Ok(())
    } else {
        Err(SettingsError::InvalidPitch(pitch))
    }
}

pub fn validate_volume(volume: f32) -> Result<(), SettingsError> {
    if VOLUME_RANGE.contains(&volume) {
        Ok(())
    } else {
        Err(SettingsError::InvalidVolume(volume))
    }
}

pub fn validate_repeat_target(target: u32) -> Result<(), SettingsError> {
    if REPEAT_TARGET_RANGE.contains(&target) {
        Ok(())
    } else {
        Err(SettingsError::InvalidRepeatTarget(target))
    }
}

/// Validate settings values.
pub fn validate_settings(settings: &NarrationSettings) -> Result<(), SettingsError> {
    if settings.language.trim().is_empty() {
        return Err(SettingsError::EmptyLanguage);
    }

    validate_rate(settings.rate)?;
    validate_pitch(settings.pitch)?;
    validate_volume(settings.volume)?;
    validate_repeat_target(settings.repeat_target)?;

    if settings.synthesis_max_retries > MAX_SYNTHESIS_RETRIES {
        return Err(SettingsError::InvalidRetryCount(settings.synthesis_max_retries));
    }

    if settings.capture_timeout_ms == 0 {
        return Err(SettingsError::ZeroDuration("Capture timeout"));
    }
    if settings.silence_window_ms == 0 {
        return Err(SettingsError::ZeroDuration("Silence window"));
    }
    if settings.max_dictation_session_ms == 0 {
        return Err(SettingsError::ZeroDuration("Dictation session length"));
    }

    Ok(())
}
