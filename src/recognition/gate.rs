//! Hotword gate: routes a speaker's audio to the hotword engine or to the
//! open transcription session.

use crate::recognition::engine::{HotwordDetection, HotwordEngine};
use crate::recognition::frame::AudioFrame;
use crate::recognition::session::SessionEvent;
use crate::recognition::transcriber::{SessionOutcome, Transcriber};
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    /// Frames go to the hotword engine.
    Idle,
    /// Frames go to the open transcription session.
    Listening,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GateEvent {
    Hotword(HotwordDetection),
    Finished(SessionOutcome),
}

pub struct HotwordGate {
    hotword: Box<dyn HotwordEngine>,
    transcriber: Transcriber,
}

impl HotwordGate {
    pub fn new(hotword: Box<dyn HotwordEngine>, transcriber: Transcriber) -> Self {
        Self {
            hotword,
            transcriber,
        }
    }

    pub fn state(&self) -> GateState {
        if self.transcriber.is_open() {
            GateState::Listening
        } else {
            GateState::Idle
        }
    }

    /// Routes one frame. While listening the hotword engine never sees audio,
    /// so the wake phrase can't re-trigger mid-command.
    pub fn on_frame(&mut self, frame: &AudioFrame) -> Vec<GateEvent> {
        if self.transcriber.is_open() {
            let outcome = self.transcriber.push_audio(&frame.samples);
            return self.finished(outcome);
        }

        match self.hotword.write(&frame.samples) {
            Ok(None) => Vec::new(),
            Ok(Some(detection)) => {
                info!(index = detection.index, label = %detection.label, "hotword detected");
                match self.transcriber.open() {
                    Ok(_) => vec![GateEvent::Hotword(detection)],
                    Err(e) => {
                        warn!(error = %e, "could not open transcription session");
                        self.hotword.reset();
                        vec![
                            GateEvent::Hotword(detection),
                            GateEvent::Finished(SessionOutcome::Unmatched {
                                text: String::new(),
                            }),
                        ]
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "hotword engine error, staying idle");
                Vec::new()
            }
        }
    }

    pub fn on_session_event(&mut self, event: SessionEvent) -> Vec<GateEvent> {
        let outcome = self.transcriber.handle(event);
        self.finished(outcome)
    }

    /// Ends any open session; used when the speaker's audio stream ends.
    pub fn shutdown(&mut self) -> Option<GateEvent> {
        let outcome = self.transcriber.abort()?;
        self.hotword.reset();
        Some(GateEvent::Finished(outcome))
    }

    fn finished(&mut self, outcome: Option<SessionOutcome>) -> Vec<GateEvent> {
        match outcome {
            Some(outcome) => {
                debug!("back to hotword listening");
                self.hotword.reset();
                vec![GateEvent::Finished(outcome)]
            }
            None => Vec::new(),
        }
    }
}
