//! Audio frames delivered per speaker by the voice transport.

use crate::defaults;
use tokio::time::Instant;

/// Decoded mono 16 kHz PCM16 audio from one speaking participant.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    /// Sequence number for ordering frames.
    pub sequence: u64,
    /// Timestamp when the frame was received.
    pub timestamp: Instant,
    /// Audio samples as 16-bit PCM.
    pub samples: Vec<i16>,
}

impl AudioFrame {
    /// Creates a new audio frame.
    pub fn new(sequence: u64, samples: Vec<i16>) -> Self {
        Self {
            sequence,
            timestamp: Instant::now(),
            samples,
        }
    }

    /// A frame of digital silence lasting `ms` milliseconds.
    pub fn silence(sequence: u64, ms: u32) -> Self {
        Self::new(sequence, vec![0; defaults::samples_for_ms(ms)])
    }

    /// Returns the duration of this frame in milliseconds.
    pub fn duration_ms(&self) -> u32 {
        (self.samples.len() as u64 * 1000 / u64::from(defaults::SAMPLE_RATE)) as u32
    }

    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|&s| s == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_frame_length() {
        let frame = AudioFrame::silence(3, 100);
        assert_eq!(frame.samples.len(), 1600);
        assert_eq!(frame.duration_ms(), 100);
        assert_eq!(frame.sequence, 3);
        assert!(frame.is_silent());
    }

    #[test]
    fn test_non_silent_frame() {
        let frame = AudioFrame::new(0, vec![0, 12, 0]);
        assert!(!frame.is_silent());
        assert_eq!(frame.duration_ms(), 0);
    }
}
