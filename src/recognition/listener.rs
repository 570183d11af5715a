//! Per-speaker recognition task.
//!
//! Each speaking participant gets one [`Listener`] running on its own tokio
//! task. It owns the speaker's [`HotwordGate`] and translates gate output
//! into [`RecognitionEvent`]s for the voice session.

use crate::recognition::command::CommandTable;
use crate::recognition::engine::{HotwordEngine, SpeechEngine};
use crate::recognition::frame::AudioFrame;
use crate::recognition::gate::{GateEvent, HotwordGate};
use crate::recognition::matcher::CommandMatcher;
use crate::recognition::session::SessionEvent;
use crate::recognition::transcriber::{SessionOutcome, Transcriber, TranscriberConfig};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

/// Voice-chat participant identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SpeakerId(pub String);

impl fmt::Display for SpeakerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SpeakerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// What the recognition pipeline reports to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RecognitionEvent {
    Hotword {
        speaker: SpeakerId,
    },
    Command {
        speaker: SpeakerId,
        name: String,
        argument: String,
    },
    BadCommand {
        speaker: SpeakerId,
        text: String,
    },
}

impl RecognitionEvent {
    pub fn from_outcome(speaker: SpeakerId, outcome: SessionOutcome) -> Self {
        match outcome {
            SessionOutcome::Matched { command, argument } => RecognitionEvent::Command {
                speaker,
                name: command,
                argument,
            },
            SessionOutcome::Unmatched { text } | SessionOutcome::Aborted { text } => {
                RecognitionEvent::BadCommand { speaker, text }
            }
        }
    }

    pub fn speaker(&self) -> &SpeakerId {
        match self {
            RecognitionEvent::Hotword { speaker }
            | RecognitionEvent::Command { speaker, .. }
            | RecognitionEvent::BadCommand { speaker, .. } => speaker,
        }
    }
}

pub struct Listener {
    speaker: SpeakerId,
    gate: HotwordGate,
    session_events: mpsc::UnboundedReceiver<SessionEvent>,
}

impl Listener {
    pub fn new(
        speaker: SpeakerId,
        hotword: Box<dyn HotwordEngine>,
        engine: Arc<dyn SpeechEngine>,
        commands: CommandTable,
        config: TranscriberConfig,
    ) -> Self {
        let (tx, session_events) = mpsc::unbounded_channel();
        let transcriber = Transcriber::new(engine, CommandMatcher::new(commands), config, tx);
        Self {
            speaker,
            gate: HotwordGate::new(hotword, transcriber),
            session_events,
        }
    }

    /// Runs until the frame source closes, `stop` fires or is dropped, or
    /// the voice session goes away.
    ///
    /// Closing the frame source is a normal end: an open session is aborted
    /// and reported like any other terminal transition.
    pub async fn run(
        mut self,
        mut frames: mpsc::Receiver<AudioFrame>,
        mut stop: oneshot::Receiver<()>,
        events: mpsc::UnboundedSender<RecognitionEvent>,
    ) {
        info!(speaker = %self.speaker, "listening for hotword");

        loop {
            let gate_events = tokio::select! {
                _ = &mut stop => {
                    debug!(speaker = %self.speaker, "listener stopped by voice session");
                    self.close(&events);
                    break;
                }
                Some(event) = self.session_events.recv() => self.gate.on_session_event(event),
                frame = frames.recv() => match frame {
                    Some(frame) => self.gate.on_frame(&frame),
                    None => {
                        debug!(speaker = %self.speaker, "audio source closed");
                        self.close(&events);
                        break;
                    }
                },
            };

            for event in gate_events {
                if !self.forward(event, &events) {
                    debug!(speaker = %self.speaker, "voice session gone, stopping listener");
                    self.gate.shutdown();
                    return;
                }
            }
        }

        info!(speaker = %self.speaker, "listener stopped");
    }

    fn close(&mut self, events: &mpsc::UnboundedSender<RecognitionEvent>) {
        if let Some(event) = self.gate.shutdown() {
            self.forward(event, events);
        }
    }

    fn forward(&self, event: GateEvent, events: &mpsc::UnboundedSender<RecognitionEvent>) -> bool {
        let speaker = self.speaker.clone();
        let event = match event {
            GateEvent::Hotword(_) => RecognitionEvent::Hotword { speaker },
            GateEvent::Finished(outcome) => RecognitionEvent::from_outcome(speaker, outcome),
        };
        events.send(event).is_ok()
    }
}
