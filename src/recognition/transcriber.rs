//! Adaptive endpointing for one speaker.
//!
//! The transcriber owns at most one [`TranscriptionSession`]. Every update
//! from the speech engine is matched against the command table on the
//! cumulative final text plus the latest stable partial:
//!
//! - diverged from every command → finalize unmatched right away
//! - confirmed and at `max_words` → finalize matched right away
//! - confirmed below `max_words` → (re)start the early-cutoff timer
//! - still growing → (re)start the no-match timer
//!
//! The silence timer keeps feeding zeros to the engine while the speaker is
//! quiet so it flushes pending results.

use crate::config::RecognitionConfig;
use crate::defaults;
use crate::error::Result;
use crate::recognition::command::{CommandTable, join_transcript};
use crate::recognition::engine::{
    RecognitionRequest, SpeechEngine, SpeechEvent, TranscriptUpdate,
};
use crate::recognition::frame::AudioFrame;
use crate::recognition::matcher::{CommandMatcher, Evaluation, MatchState};
use crate::recognition::session::{
    SessionEvent, SessionEventKind, SessionId, SpeechEventSender, TimerKind, Timers,
    TranscriptionSession,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SessionOutcome {
    /// A command was recognized; `argument` is the transcript after its name.
    Matched { command: String, argument: String },
    /// The transcript diverged from every command, or the engine gave up.
    Unmatched { text: String },
    /// Nothing matched before the no-match timer, or the speaker left.
    Aborted { text: String },
}

impl SessionOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, SessionOutcome::Matched { .. })
    }
}

/// Timing and request parameters for transcription sessions.
#[derive(Debug, Clone)]
pub struct TranscriberConfig {
    pub silence: Duration,
    pub silence_frame_ms: u32,
    pub early_cutoff: Duration,
    pub no_match: Duration,
    pub stability_threshold: f32,
    pub request: RecognitionRequest,
}

impl TranscriberConfig {
    pub fn from_config(config: &RecognitionConfig, table: &CommandTable) -> Self {
        Self {
            silence: config.silence(),
            silence_frame_ms: config.silence_frame_ms,
            early_cutoff: config.early_cutoff(),
            no_match: config.no_match(),
            stability_threshold: config.stability_threshold,
            request: RecognitionRequest {
                language: config.language.clone(),
                alternative_languages: config.alternative_languages.clone(),
                phrases: table.phrases(),
                sample_rate: defaults::SAMPLE_RATE,
            },
        }
    }
}

pub struct Transcriber {
    engine: Arc<dyn SpeechEngine>,
    matcher: CommandMatcher,
    config: TranscriberConfig,
    events: mpsc::UnboundedSender<SessionEvent>,
    session: Option<TranscriptionSession>,
    next_id: u64,
}

fn transcript_so_far(session: &TranscriptionSession) -> String {
    join_transcript(&session.accumulated_final_text, &session.partial_tail)
}

impl Transcriber {
    /// Creates a transcriber whose sessions report into `events`.
    pub fn new(
        engine: Arc<dyn SpeechEngine>,
        matcher: CommandMatcher,
        config: TranscriberConfig,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            engine,
            matcher,
            config,
            events,
            session: None,
            next_id: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn candidate(&self) -> Option<&MatchState> {
        self.session.as_ref().and_then(|s| s.candidate.as_ref())
    }

    /// Opens a new session, tearing down any session still open.
    pub fn open(&mut self) -> Result<SessionId> {
        if let Some(old) = self.session.take() {
            warn!(session = %old.id, "replacing a transcription session that was still open");
        }

        self.next_id += 1;
        let id = SessionId(self.next_id);
        let stream = self.engine.open(
            &self.config.request,
            SpeechEventSender::new(id, self.events.clone()),
        )?;

        let mut timers = Timers::new(id, self.events.clone());
        timers.arm(TimerKind::Silence, self.config.silence);
        timers.arm(TimerKind::NoMatch, self.config.no_match);
        self.session = Some(TranscriptionSession::new(id, stream, timers));

        debug!(session = %id, "transcription session opened");
        Ok(id)
    }

    /// Forwards speaker audio to the open session.
    pub fn push_audio(&mut self, samples: &[i16]) -> Option<SessionOutcome> {
        let silence = self.config.silence;
        let session = self.session.as_mut()?;
        if let Err(e) = session.stream().write(samples) {
            warn!(session = %session.id, error = %e, "speech stream rejected audio");
            let text = transcript_so_far(session);
            return self.finish(SessionOutcome::Unmatched { text });
        }
        session.timers.arm(TimerKind::Silence, silence);
        None
    }

    /// Handles an engine result or a timer. Events for any other session are ignored.
    pub fn handle(&mut self, event: SessionEvent) -> Option<SessionOutcome> {
        let Some(session) = self.session.as_mut() else {
            trace!(session = %event.session, "event after session closed, ignoring");
            return None;
        };
        if session.id != event.session {
            trace!(session = %event.session, current = %session.id, "stale session event, ignoring");
            return None;
        }

        match event.kind {
            SessionEventKind::Speech(SpeechEvent::Update(update)) => self.on_update(update),
            SessionEventKind::Speech(SpeechEvent::End) => self.on_end(),
            SessionEventKind::Speech(SpeechEvent::Error(message)) => {
                warn!(session = %session.id, %message, "speech engine error");
                let text = transcript_so_far(session);
                self.finish(SessionOutcome::Unmatched { text })
            }
            SessionEventKind::Timer { kind, generation } => {
                if !session.timers.take_fired(kind, generation) {
                    trace!(session = %session.id, ?kind, "superseded timer, ignoring");
                    return None;
                }
                self.on_timer(kind)
            }
        }
    }

    /// Ends the open session because its speaker went away.
    pub fn abort(&mut self) -> Option<SessionOutcome> {
        let text = self.session.as_ref()?.accumulated_final_text.clone();
        self.finish(SessionOutcome::Aborted { text })
    }

    fn on_update(&mut self, update: TranscriptUpdate) -> Option<SessionOutcome> {
        let TranscriberConfig {
            stability_threshold,
            early_cutoff,
            no_match,
            ..
        } = self.config;
        let session = self.session.as_mut()?;

        if !update.is_final && update.stability < stability_threshold {
            trace!(session = %session.id, text = %update.text, stability = update.stability, "unstable partial");
            return None;
        }

        let transcript = if update.is_final {
            session.accumulated_final_text =
                join_transcript(&session.accumulated_final_text, &update.text);
            session.partial_tail.clear();
            session.accumulated_final_text.clone()
        } else {
            session.partial_tail = update.text;
            transcript_so_far(session)
        };
        debug!(session = %session.id, %transcript, is_final = update.is_final, "transcript update");

        match self.matcher.evaluate(&transcript, Instant::now()) {
            Evaluation::Exhausted => self.finish(SessionOutcome::Unmatched { text: transcript }),
            Evaluation::Matched {
                state,
                complete: true,
            } => self.finish(SessionOutcome::Matched {
                command: state.command.name().to_string(),
                argument: state.argument,
            }),
            Evaluation::Matched {
                state,
                complete: false,
            } => {
                session.timers.cancel(TimerKind::NoMatch);
                session.timers.arm(TimerKind::EarlyCutoff, early_cutoff);
                session.candidate = Some(state);
                None
            }
            Evaluation::Pending => {
                if session.candidate.take().is_some() {
                    session.timers.cancel(TimerKind::EarlyCutoff);
                }
                session.timers.arm(TimerKind::NoMatch, no_match);
                None
            }
        }
    }

    fn on_end(&mut self) -> Option<SessionOutcome> {
        let session = self.session.as_ref()?;
        let outcome = match &session.candidate {
            Some(state) => SessionOutcome::Matched {
                command: state.command.name().to_string(),
                argument: state.argument.clone(),
            },
            None => SessionOutcome::Unmatched {
                text: transcript_so_far(session),
            },
        };
        self.finish(outcome)
    }

    fn on_timer(&mut self, kind: TimerKind) -> Option<SessionOutcome> {
        let silence = self.config.silence;
        let silence_frame_ms = self.config.silence_frame_ms;
        let session = self.session.as_mut()?;

        match kind {
            TimerKind::Silence => {
                let frame = AudioFrame::silence(session.next_silence_sequence(), silence_frame_ms);
                trace!(session = %session.id, sequence = frame.sequence, "feeding silence");
                if let Err(e) = session.stream().write(&frame.samples) {
                    warn!(session = %session.id, error = %e, "speech stream rejected silence");
                    let text = transcript_so_far(session);
                    return self.finish(SessionOutcome::Unmatched { text });
                }
                session.timers.arm(TimerKind::Silence, silence);
                None
            }
            TimerKind::EarlyCutoff => {
                let state = session.candidate.clone()?;
                self.finish(SessionOutcome::Matched {
                    command: state.command.name().to_string(),
                    argument: state.argument,
                })
            }
            TimerKind::NoMatch => {
                if session.candidate.is_some() {
                    return None;
                }
                let text = session.accumulated_final_text.clone();
                self.finish(SessionOutcome::Aborted { text })
            }
        }
    }

    /// Drops the session, which cancels its timers and closes its stream.
    fn finish(&mut self, outcome: SessionOutcome) -> Option<SessionOutcome> {
        if let Some(session) = self.session.take() {
            info!(
                session = %session.id,
                elapsed_ms = session.opened_at.elapsed().as_millis() as u64,
                ?outcome,
                "transcription session finished"
            );
        }
        Some(outcome)
    }
}
