//! Interfaces to the hotword spotter and the streaming speech engine.
//!
//! Both engines are external collaborators. The traits here are what the
//! recognition pipeline needs from them; the mock implementations drive the
//! tests and the `simulate` command.

use crate::error::{Result, VoiceDjError};
use crate::recognition::session::{SessionId, SpeechEventSender};
use crate::sync::lock;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A wake phrase was spotted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HotwordDetection {
    /// Index of the model that fired.
    pub index: usize,
    /// Label of the wake phrase.
    pub label: String,
}

/// Hotword spotting engine consuming a live audio stream.
pub trait HotwordEngine: Send {
    /// Feeds one frame. Must not block.
    ///
    /// Returns a detection when this frame completes the wake phrase.
    fn write(&mut self, samples: &[i16]) -> Result<Option<HotwordDetection>>;

    /// Clears internal state after a session ends.
    fn reset(&mut self) {}
}

/// One transcript update from the streaming engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptUpdate {
    pub text: String,
    pub is_final: bool,
    /// Stability (for partials) or confidence (for finals), 0.0..=1.0.
    pub stability: f32,
}

impl TranscriptUpdate {
    pub fn partial(text: &str, stability: f32) -> Self {
        Self {
            text: text.to_string(),
            is_final: false,
            stability,
        }
    }

    pub fn final_result(text: &str) -> Self {
        Self {
            text: text.to_string(),
            is_final: true,
            stability: 1.0,
        }
    }
}

/// Ordered output of a streaming recognition.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechEvent {
    Update(TranscriptUpdate),
    /// The engine closed the stream normally.
    End,
    /// The engine failed; no further events follow.
    Error(String),
}

/// Parameters sent to the engine when a session opens.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionRequest {
    pub language: String,
    pub alternative_languages: Vec<String>,
    /// Phrase hints (the command names).
    pub phrases: Vec<String>,
    pub sample_rate: u32,
}

/// An open streaming recognition.
pub trait SpeechStream: Send {
    fn write(&mut self, samples: &[i16]) -> Result<()>;

    /// Half-closes the stream. Idempotent.
    fn finish(&mut self);
}

/// Streaming transcription engine.
pub trait SpeechEngine: Send + Sync {
    /// Opens a stream; results are delivered through `events`.
    fn open(
        &self,
        request: &RecognitionRequest,
        events: SpeechEventSender,
    ) -> Result<Box<dyn SpeechStream>>;
}

/// Sample value that makes [`MockHotwordEngine`] fire.
pub const HOTWORD_MARKER: i16 = 0x7a7a;

/// Mock hotword engine: fires on frames made entirely of [`HOTWORD_MARKER`].
#[derive(Debug, Clone)]
pub struct MockHotwordEngine {
    label: String,
    frames_seen: Arc<AtomicUsize>,
    should_fail: bool,
}

impl MockHotwordEngine {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            frames_seen: Arc::new(AtomicUsize::new(0)),
            should_fail: false,
        }
    }

    /// Configure the mock to fail on every write
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Counter of frames written, shared with clones.
    pub fn frames_seen(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.frames_seen)
    }

    /// A frame that triggers the mock.
    pub fn marker_samples() -> Vec<i16> {
        vec![HOTWORD_MARKER; crate::defaults::FRAME_SAMPLES]
    }
}

impl HotwordEngine for MockHotwordEngine {
    fn write(&mut self, samples: &[i16]) -> Result<Option<HotwordDetection>> {
        self.frames_seen.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(VoiceDjError::HotwordEngine {
                message: "mock hotword failure".to_string(),
            });
        }
        if !samples.is_empty() && samples.iter().all(|&s| s == HOTWORD_MARKER) {
            Ok(Some(HotwordDetection {
                index: 0,
                label: self.label.clone(),
            }))
        } else {
            Ok(None)
        }
    }
}

/// What the mock speech engine recorded about one opened stream.
#[derive(Debug, Clone)]
pub struct MockSpeechSession {
    pub request: RecognitionRequest,
    events: SpeechEventSender,
    samples_written: Arc<AtomicUsize>,
    finished: Arc<Mutex<bool>>,
}

impl MockSpeechSession {
    pub fn session(&self) -> SessionId {
        self.events.session()
    }

    pub fn send(&self, event: SpeechEvent) -> bool {
        self.events.send(event)
    }

    pub fn update(&self, update: TranscriptUpdate) -> bool {
        self.send(SpeechEvent::Update(update))
    }

    pub fn samples_written(&self) -> usize {
        self.samples_written.load(Ordering::SeqCst)
    }

    pub fn is_finished(&self) -> bool {
        *lock(&self.finished)
    }
}

struct MockSpeechStream {
    session: SessionId,
    samples_written: Arc<AtomicUsize>,
    finished: Arc<Mutex<bool>>,
    fail_writes: bool,
}

impl SpeechStream for MockSpeechStream {
    fn write(&mut self, samples: &[i16]) -> Result<()> {
        if *lock(&self.finished) {
            return Err(VoiceDjError::SessionClosed {
                session: self.session.0,
            });
        }
        if self.fail_writes {
            return Err(VoiceDjError::SpeechEngine {
                message: "mock stream write failure".to_string(),
            });
        }
        self.samples_written
            .fetch_add(samples.len(), Ordering::SeqCst);
        Ok(())
    }

    fn finish(&mut self) {
        *lock(&self.finished) = true;
    }
}

#[derive(Default)]
struct MockSpeechState {
    sessions: Vec<MockSpeechSession>,
    scripts: VecDeque<Vec<TranscriptUpdate>>,
}

/// Mock streaming engine.
///
/// Records every opened stream so tests can push events into it. Scripted
/// utterances (see [`MockSpeechEngine::with_script`]) are replayed
/// automatically, one per opened stream, with `step` between updates.
#[derive(Clone, Default)]
pub struct MockSpeechEngine {
    state: Arc<Mutex<MockSpeechState>>,
    step: Duration,
    fail_open: bool,
    fail_writes: bool,
}

impl MockSpeechEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an utterance to replay on the next opened stream.
    pub fn with_script(self, updates: Vec<TranscriptUpdate>, step: Duration) -> Self {
        lock(&self.state).scripts.push_back(updates);
        Self { step, ..self }
    }

    /// Configure the mock to refuse opening streams
    pub fn with_open_failure(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Configure opened streams to reject audio
    pub fn with_write_failure(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Builds the partial-then-final updates for a spoken sentence.
    pub fn utterance(text: &str) -> Vec<TranscriptUpdate> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let mut updates: Vec<TranscriptUpdate> = (1..words.len())
            .map(|n| TranscriptUpdate::partial(&words[..n].join(" "), 0.9))
            .collect();
        updates.push(TranscriptUpdate::final_result(&words.join(" ")));
        updates
    }

    pub fn sessions(&self) -> Vec<MockSpeechSession> {
        lock(&self.state).sessions.clone()
    }

    pub fn last_session(&self) -> Option<MockSpeechSession> {
        lock(&self.state).sessions.last().cloned()
    }
}

impl SpeechEngine for MockSpeechEngine {
    fn open(
        &self,
        request: &RecognitionRequest,
        events: SpeechEventSender,
    ) -> Result<Box<dyn SpeechStream>> {
        if self.fail_open {
            return Err(VoiceDjError::SpeechEngine {
                message: "mock engine refused to open".to_string(),
            });
        }

        let session = events.session();
        let samples_written = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(Mutex::new(false));
        let script = {
            let mut state = lock(&self.state);
            state.sessions.push(MockSpeechSession {
                request: request.clone(),
                events: events.clone(),
                samples_written: Arc::clone(&samples_written),
                finished: Arc::clone(&finished),
            });
            state.scripts.pop_front()
        };

        if let Some(updates) = script {
            let step = self.step;
            tokio::spawn(async move {
                for update in updates {
                    tokio::time::sleep(step).await;
                    if !events.send(SpeechEvent::Update(update)) {
                        break;
                    }
                }
            });
        }

        Ok(Box::new(MockSpeechStream {
            session,
            samples_written,
            finished,
            fail_writes: self.fail_writes,
        }))
    }
}
