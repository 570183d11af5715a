//! Default configuration constants for voicedj.
//!
//! Shared by the config types and the recognition pipeline so both agree on
//! the same timing and audio format.

/// Audio sample rate in Hz delivered by the voice transport after decoding.
pub const SAMPLE_RATE: u32 = 16000;

/// Samples in one 20ms transport frame at [`SAMPLE_RATE`].
pub const FRAME_SAMPLES: usize = 320;

/// Silence timer in milliseconds.
///
/// When no audio arrives for this long during a transcription session,
/// synthetic silence is fed to the speech engine so it flushes a result.
pub const SILENCE_MS: u64 = 250;

/// Amount of synthetic silence written per silence-timer tick.
pub const SILENCE_FRAME_MS: u32 = 100;

/// Early-cutoff timer in milliseconds.
///
/// Started once a command has enough argument words; finalizes the session
/// without waiting for the engine to end the utterance.
pub const EARLY_CUTOFF_MS: u64 = 1000;

/// No-match abort timer in milliseconds.
pub const NO_MATCH_MS: u64 = 3000;

/// Partial transcripts below this stability are not evaluated.
pub const STABILITY_THRESHOLD: f32 = 0.8;

/// Primary recognition language.
pub const DEFAULT_LANGUAGE: &str = "de-DE";

/// Alternative languages offered to the speech engine.
pub const ALTERNATIVE_LANGUAGES: &[&str] = &["en-US"];

/// Longest synthetic silence frame the silence timer may feed.
pub const MAX_SILENCE_FRAME_MS: u32 = 1000;

/// Whether an empty queue falls through to related-track autoplay.
pub const AUTOPLAY: bool = true;

/// How many related candidates autoplay tries before giving up.
pub const AUTOPLAY_MAX_ATTEMPTS: u32 = 5;

/// Built-in command table: `(name, min_words, max_words)`.
///
/// Word counts refer to the words following the command name.
pub const COMMANDS: &[(&str, usize, usize)] = &[
    ("play", 1, 20),
    ("add", 1, 20),
    ("pause", 0, 0),
    ("resume", 0, 0),
    ("skip", 0, 0),
    ("stop", 0, 0),
    ("leave", 0, 0),
    ("next result", 0, 0),
];

/// Number of samples for `ms` milliseconds of mono audio at [`SAMPLE_RATE`].
pub fn samples_for_ms(ms: u32) -> usize {
    (SAMPLE_RATE as usize * ms as usize) / 1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_samples_is_twenty_ms() {
        assert_eq!(samples_for_ms(20), FRAME_SAMPLES);
    }

    #[test]
    fn timers_are_ordered() {
        assert!(SILENCE_FRAME_MS <= MAX_SILENCE_FRAME_MS);
        assert!(SILENCE_MS < EARLY_CUTOFF_MS);
        assert!(EARLY_CUTOFF_MS < NO_MATCH_MS);
    }

    #[test]
    fn command_table_bounds_are_consistent() {
        for (name, min, max) in COMMANDS {
            assert!(min <= max, "{name}: min_words > max_words");
        }
    }
}
