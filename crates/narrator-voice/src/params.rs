//! Translating user voice parameters into what the synthesiser receives.
//!
//! Synthesis engines cap their rate at [`ENGINE_MAX_RATE`]. Rates above the
//! cap are approximated by raising pitch, which listeners perceive as faster
//! speech:
//!
//! ```text
//!   engine_rate  = min(rate, 3.0)
//!   engine_pitch = pitch + (rate - 3.0) / 18.0     (only when rate > 3.0)
//! ```
//!
//! The divisor is a tuning constant, not a physical relationship.

use std::time::Duration;

use narrator_core::VoiceParams;
use narrator_core::ports::{SpeakParams, SynthesisPort, VoiceDescriptor};

/// Highest rate the synthesis engine honours.
pub const ENGINE_MAX_RATE: f32 = 3.0;

/// Rate units above the cap per unit of added pitch.
pub const PITCH_BOOST_DIVISOR: f32 = 18.0;

/// Rate actually sent to the engine.
pub fn engine_rate(rate: f32) -> f32 {
    rate.min(ENGINE_MAX_RATE)
}

/// Pitch actually sent to the engine for the requested rate.
pub fn engine_pitch(rate: f32, pitch: f32) -> f32 {
    if rate > ENGINE_MAX_RATE {
        pitch + (rate - ENGINE_MAX_RATE) / PITCH_BOOST_DIVISOR
    } else {
        pitch
    }
}

/// Build per-utterance parameters from the session's voice parameters.
pub fn speak_params(params: &VoiceParams) -> SpeakParams {
    SpeakParams {
        voice_id: params.voice_id.clone(),
        language: params.language.clone(),
        rate: engine_rate(params.rate),
        pitch: engine_pitch(params.rate, params.pitch),
        volume: params.volume,
    }
}

/// Push every engine-wide default derived from `params` to the port.
pub fn apply_engine_defaults(port: &dyn SynthesisPort, params: &VoiceParams) {
    port.set_default_language(&params.language);
    port.set_default_rate(engine_rate(params.rate));
    port.set_default_pitch(engine_pitch(params.rate, params.pitch));
    if let Some(ref voice_id) = params.voice_id {
        port.set_default_voice(voice_id);
    }
}

/// Choose a replacement voice after a synthesis failure.
///
/// Picks the best-quality voice for `language` other than `current`. Ties are
/// broken by id so the choice is stable across calls.
pub fn pick_fallback_voice<'a>(
    voices: &'a [VoiceDescriptor],
    language: &str,
    current: Option<&str>,
) -> Option<&'a VoiceDescriptor> {
    voices
        .iter()
        .filter(|v| v.speaks(language))
        .filter(|v| current != Some(v.id.as_str()))
        .max_by(|a, b| a.quality.cmp(&b.quality).then_with(|| b.id.cmp(&a.id)))
}

// ── Retry policy ───────────────────────────────────────────────────

/// How often, and how patiently, a failed utterance is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry, minus one `step`.
    pub base_delay: Duration,
    /// Extra delay added per attempt.
    pub step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(300),
            step: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// A policy with the default back-off and `max_retries` retries.
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based): `base + step * attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay + self.step * attempt
    }
}

#[cfg(test)]
mod tests {
    use narrator_core::ports::VoiceQuality;

    use super::*;

    fn voice(id: &str, language: &str, quality: VoiceQuality) -> VoiceDescriptor {
        VoiceDescriptor {
            id: id.to_string(),
            name: id.to_string(),
            language: language.to_string(),
            quality,
        }
    }

    #[test]
    fn rate_is_capped_and_pitch_boosted() {
        assert!((engine_rate(4.8) - 3.0).abs() < f32::EPSILON);
        assert!((engine_pitch(4.8, 1.0) - 1.1).abs() < 1e-6);
    }

    #[test]
    fn rates_under_cap_pass_through() {
        assert!((engine_rate(2.0) - 2.0).abs() < f32::EPSILON);
        assert!((engine_pitch(2.0, 1.2) - 1.2).abs() < f32::EPSILON);
        assert!((engine_pitch(3.0, 1.0) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn speak_params_apply_coupling() {
        let params = VoiceParams {
            rate: 6.0,
            pitch: 1.0,
            ..VoiceParams::default()
        };
        let sent = speak_params(&params);
        assert!((sent.rate - 3.0).abs() < f32::EPSILON);
        assert!((sent.pitch - (1.0 + 3.0 / 18.0)).abs() < 1e-6);
        assert_eq!(sent.language, "ko-KR");
    }

    #[test]
    fn fallback_prefers_enhanced_voice_in_language() {
        let voices = vec![
            voice("en-1", "en-US", VoiceQuality::Enhanced),
            voice("ko-1", "ko-KR", VoiceQuality::Default),
            voice("ko-2", "ko-KR", VoiceQuality::Enhanced),
        ];
        let picked = pick_fallback_voice(&voices, "ko-KR", None).unwrap();
        assert_eq!(picked.id, "ko-2");
    }

    #[test]
    fn fallback_skips_failing_voice() {
        let voices = vec![
            voice("ko-1", "ko-KR", VoiceQuality::Default),
            voice("ko-2", "ko-KR", VoiceQuality::Enhanced),
        ];
        let picked = pick_fallback_voice(&voices, "ko", Some("ko-2")).unwrap();
        assert_eq!(picked.id, "ko-1");
        assert!(pick_fallback_voice(&voices[..1], "ko", Some("ko-1")).is_none());
    }

    #[test]
    fn fallback_ties_break_on_lowest_id() {
        let voices = vec![
            voice("ko-b", "ko-KR", VoiceQuality::Default),
            voice("ko-a", "ko-KR", VoiceQuality::Default),
        ];
        assert_eq!(pick_fallback_voice(&voices, "ko", None).unwrap().id, "ko-a");
    }

    #[test]
    fn backoff_grows_linearly() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(2), Duration::from_millis(700));
    }
}
