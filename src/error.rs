//! Error types for voicedj.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceDjError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Recognition errors
    #[error("Hotword engine error: {message}")]
    HotwordEngine { message: String },

    #[error("Speech engine error: {message}")]
    SpeechEngine { message: String },

    #[error("Transcription session {session} is closed")]
    SessionClosed { session: u64 },

    // Resolution errors
    #[error("No track found for '{query}'")]
    TrackNotFound { query: String },

    #[error("No more search results for '{query}'")]
    SearchExhausted { query: String },

    #[error("Track download failed: {message}")]
    Download { message: String },

    // Playback errors
    #[error("Audio sink error: {message}")]
    AudioSink { message: String },

    #[error("Nothing is playing")]
    NothingPlaying,

    #[error("Playback controller is gone")]
    PlayerGone,

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl VoiceDjError {
    /// Returns true for errors raised while turning a query into a playable track.
    ///
    /// These are never fatal: the controller advances the queue or reports them.
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            VoiceDjError::TrackNotFound { .. }
                | VoiceDjError::SearchExhausted { .. }
                | VoiceDjError::Download { .. }
        )
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, VoiceDjError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_invalid_value_display() {
        let error = VoiceDjError::ConfigInvalidValue {
            key: "recognition.no_match_ms".to_string(),
            message: "must be positive".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for recognition.no_match_ms: must be positive"
        );
    }

    #[test]
    fn test_track_not_found_display() {
        let error = VoiceDjError::TrackNotFound {
            query: "never gonna".to_string(),
        };
        assert_eq!(error.to_string(), "No track found for 'never gonna'");
    }

    #[test]
    fn test_search_exhausted_display() {
        let error = VoiceDjError::SearchExhausted {
            query: "eminem".to_string(),
        };
        assert_eq!(error.to_string(), "No more search results for 'eminem'");
    }

    #[test]
    fn test_session_closed_display() {
        let error = VoiceDjError::SessionClosed { session: 7 };
        assert_eq!(error.to_string(), "Transcription session 7 is closed");
    }

    #[test]
    fn test_resolution_classification() {
        assert!(
            VoiceDjError::TrackNotFound {
                query: "x".to_string()
            }
            .is_resolution()
        );
        assert!(
            VoiceDjError::Download {
                message: "timeout".to_string()
            }
            .is_resolution()
        );
        assert!(!VoiceDjError::NothingPlaying.is_resolution());
        assert!(
            !VoiceDjError::SpeechEngine {
                message: "io".to_string()
            }
            .is_resolution()
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: VoiceDjError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_error = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let error: VoiceDjError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));

        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.source().is_some());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<VoiceDjError>();
        assert_sync::<VoiceDjError>();
    }
}
