//! Playback vocabulary shared by the engine, settings and adapters.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::UnitKind;

// ── Play mode ──────────────────────────────────────────────────────

/// How the playback engine moves between content units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayMode {
    /// Speak one unit and stop.
    #[default]
    Single,

    /// Speak every unit through to the end of the chapter.
    Continuous,

    /// Speak each unit a fixed number of times before advancing.
    Repeat,
}

impl PlayMode {
    /// Stable lowercase label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Continuous => "continuous",
            Self::Repeat => "repeat",
        }
    }
}

impl fmt::Display for PlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a play-mode label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown play mode: {0} (expected single, continuous or repeat)")]
pub struct ParsePlayModeError(String);

impl FromStr for PlayMode {
    type Err = ParsePlayModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "continuous" => Ok(Self::Continuous),
            "repeat" => Ok(Self::Repeat),
            other => Err(ParsePlayModeError(other.to_string())),
        }
    }
}

// ── Status ─────────────────────────────────────────────────────────

/// Lifecycle status of a playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Playing,
    Paused,
    Stopped,
}

impl PlaybackStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        }
    }
}

// ── Voice parameters ───────────────────────────────────────────────

/// User-facing voice parameters for narration.
///
/// `rate` is the rate the user asked for; the synthesiser may cap it and
/// compensate with pitch (see `narrator_voice::params`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceParams {
    /// Speech rate multiplier (1.0 = normal).
    pub rate: f32,

    /// Pitch multiplier (1.0 = normal).
    pub pitch: f32,

    /// Output volume (0.0–1.0).
    pub volume: f32,

    /// Preferred synthesiser voice, if any.
    pub voice_id: Option<String>,

    /// BCP-47 language tag (e.g. `"ko-KR"`).
    pub language: String,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            voice_id: None,
            language: "ko-KR".to_string(),
        }
    }
}

// ── Inter-unit pauses ──────────────────────────────────────────────

/// Base pause after each kind of content unit, in milliseconds at rate 1.0.
///
/// Longer pauses after headings and formulas give the listener time to
/// orient themselves before the next unit starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PauseDurations {
    pub heading_ms: u64,
    pub paragraph_ms: u64,
    pub list_ms: u64,
    pub formula_ms: u64,
    pub image_description_ms: u64,
}

impl Default for PauseDurations {
    fn default() -> Self {
        Self {
            heading_ms: 1500,
            paragraph_ms: 800,
            list_ms: 500,
            formula_ms: 1200,
            image_description_ms: 1000,
        }
    }
}

impl PauseDurations {
    /// All pauses set to zero (units follow each other immediately).
    pub const fn none() -> Self {
        Self {
            heading_ms: 0,
            paragraph_ms: 0,
            list_ms: 0,
            formula_ms: 0,
            image_description_ms: 0,
        }
    }

    /// Base pause for `kind` at normal rate.
    pub const fn base_ms(&self, kind: UnitKind) -> u64 {
        match kind {
            UnitKind::Heading => self.heading_ms,
            UnitKind::Paragraph => self.paragraph_ms,
            UnitKind::List => self.list_ms,
            UnitKind::Formula => self.formula_ms,
            UnitKind::ImageDescription => self.image_description_ms,
        }
    }

    /// Pause after a unit of `kind` spoken at `rate`: `round(base / rate)`.
    ///
    /// Non-positive or non-finite rates are treated as 1.0.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn pause_after(&self, kind: UnitKind, rate: f32) -> Duration {
        let rate = if rate.is_finite() && rate > 0.0 {
            f64::from(rate)
        } else {
            1.0
        };
        let millis = (self.base_ms(kind) as f64 / rate).round();
        Duration::from_millis(millis as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraph_pause_scales_with_rate() {
        let pauses = PauseDurations::default();
        assert_eq!(
            pauses.pause_after(UnitKind::Paragraph, 2.0),
            Duration::from_millis(400)
        );
        assert_eq!(
            pauses.pause_after(UnitKind::Heading, 1.0),
            Duration::from_millis(1500)
        );
    }

    #[test]
    fn pause_is_rounded() {
        let pauses = PauseDurations::default();
        // 800 / 3 = 266.67
        assert_eq!(
            pauses.pause_after(UnitKind::Paragraph, 3.0),
            Duration::from_millis(267)
        );
    }

    #[test]
    fn degenerate_rate_falls_back_to_normal() {
        let pauses = PauseDurations::default();
        assert_eq!(
            pauses.pause_after(UnitKind::List, 0.0),
            Duration::from_millis(500)
        );
        assert_eq!(
            pauses.pause_after(UnitKind::List, f32::NAN),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn play_mode_round_trips_through_labels() {
        for mode in [PlayMode::Single, PlayMode::Continuous, PlayMode::Repeat] {
            assert_eq!(mode.to_string().parse::<PlayMode>().unwrap(), mode);
        }
        assert_eq!(" Repeat ".parse::<PlayMode>().unwrap(), PlayMode::Repeat);
        assert!("shuffle".parse::<PlayMode>().is_err());
    }
}
