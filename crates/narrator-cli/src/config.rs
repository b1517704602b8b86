//! Settings resolution.
//!
//! Built-in defaults, then the optional JSON settings file, then the global
//! flags (which clap has already filled from `NARRATOR_*` variables where no
//! flag was given). The result is validated before anything uses it.

use std::path::Path;

use narrator_core::{NarrationSettings, SettingsUpdate, validate_settings};
use tracing::debug;

use crate::error::CliError;
use crate::parser::Cli;

/// Read a settings file. Missing keys keep their defaults.
pub fn load_settings_file(path: &Path) -> Result<NarrationSettings, CliError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|e| CliError::Config(format!("{}: {e}", path.display())))
}

/// Overrides carried by the global flags.
pub fn flag_overrides(cli: &Cli) -> SettingsUpdate {
    SettingsUpdate {
        language: cli.language.clone(),
        rate: cli.rate,
        pitch: cli.pitch,
        volume: cli.volume,
        voice_id: cli.voice.clone().map(Some),
        play_mode: cli.mode,
        repeat_target: cli.repeat,
        ..SettingsUpdate::default()
    }
}

/// Resolve the effective settings for this invocation.
pub fn resolve_settings(cli: &Cli) -> Result<NarrationSettings, CliError> {
    let mut settings = match cli.settings.as_deref() {
        Some(path) => {
            debug!(path = %path.display(), "Loading settings file");
            load_settings_file(path)?
        }
        None => NarrationSettings::default(),
    };

    let overrides = flag_overrides(cli);
    if !overrides.is_empty() {
        settings.merge(&overrides);
    }
    validate_settings(&settings)?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::Parser;
    use narrator_core::PlayMode;
    use tempfile::NamedTempFile;

    use super::*;

    fn settings_file(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn file_values_fill_over_defaults() {
        let file = settings_file(r#"{ "language": "en-US", "rate": 1.25, "play_mode": "repeat" }"#);
        let settings = load_settings_file(file.path()).unwrap();
        assert_eq!(settings.language, "en-US");
        assert!((settings.rate - 1.25).abs() < f32::EPSILON);
        assert_eq!(settings.play_mode, PlayMode::Repeat);
        assert_eq!(settings.repeat_target, NarrationSettings::default().repeat_target);
    }

    #[test]
    fn flags_override_file() {
        let file = settings_file(r#"{ "rate": 1.25, "voice_id": "ko-a" }"#);
        let path = file.path().to_str().unwrap();
        let cli = Cli::parse_from([
            "narrator", "--settings", path, "--rate", "2", "--voice", "ko-b", "voices",
        ]);

        let settings = resolve_settings(&cli).unwrap();
        assert!((settings.rate - 2.0).abs() < f32::EPSILON);
        assert_eq!(settings.voice_id.as_deref(), Some("ko-b"));
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let cli = Cli::parse_from(["narrator", "--volume", "3", "voices"]);
        let err = resolve_settings(&cli).unwrap_err();
        assert_eq!(err.exit_code(), 78);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let file = settings_file("{ not json");
        let err = load_settings_file(file.path()).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_settings_file(Path::new("/nonexistent/narrator.json")).unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }
}
