use crate::defaults;
use crate::error::{Result, VoiceDjError};
use crate::recognition::command::Command;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub recognition: RecognitionConfig,
    pub playback: PlaybackConfig,
    pub commands: Vec<Command>,
}

/// Hotword/transcription configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecognitionConfig {
    pub silence_ms: u64,
    pub early_cutoff_ms: u64,
    pub no_match_ms: u64,
    pub stability_threshold: f32,
    pub silence_frame_ms: u32,
    pub language: String,
    pub alternative_languages: Vec<String>,
}

/// Playback controller configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaybackConfig {
    pub autoplay: bool,
    pub autoplay_max_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recognition: RecognitionConfig::default(),
            playback: PlaybackConfig::default(),
            commands: defaults::COMMANDS
                .iter()
                .map(|(name, min, max)| Command::new(name, *min, *max))
                .collect(),
        }
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            silence_ms: defaults::SILENCE_MS,
            early_cutoff_ms: defaults::EARLY_CUTOFF_MS,
            no_match_ms: defaults::NO_MATCH_MS,
            stability_threshold: defaults::STABILITY_THRESHOLD,
            silence_frame_ms: defaults::SILENCE_FRAME_MS,
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            alternative_languages: defaults::ALTERNATIVE_LANGUAGES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl RecognitionConfig {
    pub fn silence(&self) -> Duration {
        Duration::from_millis(self.silence_ms)
    }

    pub fn early_cutoff(&self) -> Duration {
        Duration::from_millis(self.early_cutoff_ms)
    }

    pub fn no_match(&self) -> Duration {
        Duration::from_millis(self.no_match_ms)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            autoplay: defaults::AUTOPLAY,
            autoplay_max_attempts: defaults::AUTOPLAY_MAX_ATTEMPTS,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing fields use default values. The result is validated.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VoiceDjError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                VoiceDjError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if the file doesn't exist
    ///
    /// Invalid TOML and invalid values are still errors.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(VoiceDjError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Write this configuration as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self).map_err(|e| VoiceDjError::ConfigParse {
            message: e.to_string(),
        })?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - VOICEDJ_LANGUAGE → recognition.language
    /// - VOICEDJ_AUTOPLAY → playback.autoplay ("true"/"false"/"1"/"0")
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(language) = std::env::var("VOICEDJ_LANGUAGE")
            && !language.is_empty()
        {
            self.recognition.language = language;
        }

        if let Ok(autoplay) = std::env::var("VOICEDJ_AUTOPLAY") {
            match autoplay.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.playback.autoplay = true,
                "0" | "false" | "no" | "off" => self.playback.autoplay = false,
                _ => {}
            }
        }

        self
    }

    /// Check values that deserialize fine but can't drive a session.
    pub fn validate(&self) -> Result<()> {
        let rec = &self.recognition;
        for (key, value) in [
            ("recognition.silence_ms", rec.silence_ms),
            ("recognition.early_cutoff_ms", rec.early_cutoff_ms),
            ("recognition.no_match_ms", rec.no_match_ms),
            ("recognition.silence_frame_ms", u64::from(rec.silence_frame_ms)),
        ] {
            if value == 0 {
                return Err(invalid(key, "must be greater than zero"));
            }
        }
        if rec.silence_ms >= rec.no_match_ms {
            return Err(invalid(
                "recognition.silence_ms",
                "must be shorter than no_match_ms",
            ));
        }
        if !(0.0..=1.0).contains(&rec.stability_threshold) {
            return Err(invalid(
                "recognition.stability_threshold",
                "must be between 0.0 and 1.0",
            ));
        }
        if rec.silence_frame_ms > defaults::MAX_SILENCE_FRAME_MS {
            return Err(invalid(
                "recognition.silence_frame_ms",
                &format!("must be at most {}", defaults::MAX_SILENCE_FRAME_MS),
            ));
        }
        if self.playback.autoplay && self.playback.autoplay_max_attempts == 0 {
            return Err(invalid(
                "playback.autoplay_max_attempts",
                "must be greater than zero while autoplay is enabled",
            ));
        }

        if self.commands.is_empty() {
            return Err(invalid("commands", "at least one command is required"));
        }
        let mut seen = HashSet::new();
        for command in &self.commands {
            if command.name().is_empty() {
                return Err(invalid("commands", "command name must not be empty"));
            }
            if !seen.insert(command.name()) {
                return Err(invalid(
                    "commands",
                    &format!("duplicate command '{}'", command.name()),
                ));
            }
            if command.min_words > command.max_words {
                return Err(invalid(
                    "commands",
                    &format!("'{}' has min_words > max_words", command.name()),
                ));
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/voicedj/config.toml on Linux
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("voicedj").join("config.toml"))
            .ok_or_else(|| VoiceDjError::Other("Could not determine config directory".to_string()))
    }
}

fn invalid(key: &str, message: &str) -> VoiceDjError {
    VoiceDjError::ConfigInvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}
