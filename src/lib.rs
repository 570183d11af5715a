//! voicedj - Hotword-gated voice commands driving a music queue
//!
//! Each speaker in a voice channel is listened to independently: a hotword
//! opens a streaming recognition session, the transcript is matched against a
//! small command vocabulary with adaptive endpointing, and recognized commands
//! drive a shared playback queue with autoplay.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod dispatch;
pub mod error;
pub mod player;
pub mod recognition;
pub mod simulate;
mod sync;
pub mod voice;

// Recognition seams (hotword → session → matcher)
pub use recognition::engine::{HotwordEngine, SpeechEngine, SpeechStream};
pub use recognition::listener::{Listener, RecognitionEvent, SpeakerId};
pub use recognition::transcriber::{SessionOutcome, Transcriber};

// Playback seams (resolver → controller → sink)
pub use player::actor::{PlayerHandle, PlayerSnapshot};
pub use player::controller::{PlaybackController, PlaybackEvent, PlaybackStatus};
pub use player::resolver::TrackResolver;
pub use player::sink::AudioSink;

// Session composition
pub use dispatch::{CuePlayer, DispatchAction, Dispatcher};
pub use voice::VoiceSession;

// Error handling
pub use error::{Result, VoiceDjError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.3.0+abc1234"` when git hash is available, `"0.3.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }

    #[test]
    fn version_string_has_hash_only_when_built_from_git() {
        let ver = version_string();
        match option_env!("GIT_HASH") {
            Some(hash) if !hash.is_empty() => {
                assert_eq!(ver, format!("{}+{}", env!("CARGO_PKG_VERSION"), hash));
            }
            _ => assert_eq!(ver, env!("CARGO_PKG_VERSION")),
        }
    }
}
