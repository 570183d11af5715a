//! Transcription session state and its cancellable timers.
//!
//! A session owns its speech stream and all of its timers. Dropping the
//! session aborts every timer task and half-closes the stream, so nothing
//! outlives a terminal transition. Events that were already queued when the
//! session died still carry the old [`SessionId`] and timer generation and
//! are discarded by the transcriber.

use crate::recognition::engine::{SpeechEvent, SpeechStream};
use crate::recognition::matcher::MatchState;
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Identity of one transcription session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Feed synthetic silence so the engine flushes.
    Silence,
    /// Finalize a confirmed match without waiting for the utterance to end.
    EarlyCutoff,
    /// Give up when nothing matched.
    NoMatch,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEventKind {
    Speech(SpeechEvent),
    Timer { kind: TimerKind, generation: u64 },
}

/// Anything that happens asynchronously to a session, tagged with its identity.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEvent {
    pub session: SessionId,
    pub kind: SessionEventKind,
}

/// Sender handed to the speech engine; tags every event with the session id.
#[derive(Debug, Clone)]
pub struct SpeechEventSender {
    session: SessionId,
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl SpeechEventSender {
    pub fn new(session: SessionId, tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { session, tx }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Returns false once the listener is gone.
    pub fn send(&self, event: SpeechEvent) -> bool {
        self.tx
            .send(SessionEvent {
                session: self.session,
                kind: SessionEventKind::Speech(event),
            })
            .is_ok()
    }
}

/// A running timer; aborted when dropped.
#[derive(Debug)]
struct TimerHandle {
    generation: u64,
    task: JoinHandle<()>,
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// The three endpointing timers of one session.
#[derive(Debug)]
pub struct Timers {
    session: SessionId,
    tx: mpsc::UnboundedSender<SessionEvent>,
    generation: u64,
    silence: Option<TimerHandle>,
    early_cutoff: Option<TimerHandle>,
    no_match: Option<TimerHandle>,
}

impl Timers {
    pub fn new(session: SessionId, tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self {
            session,
            tx,
            generation: 0,
            silence: None,
            early_cutoff: None,
            no_match: None,
        }
    }

    fn slot(&mut self, kind: TimerKind) -> &mut Option<TimerHandle> {
        match kind {
            TimerKind::Silence => &mut self.silence,
            TimerKind::EarlyCutoff => &mut self.early_cutoff,
            TimerKind::NoMatch => &mut self.no_match,
        }
    }

    /// Starts (or restarts) a timer. The previous instance is aborted.
    pub fn arm(&mut self, kind: TimerKind, after: Duration) {
        self.generation += 1;
        let generation = self.generation;
        let session = self.session;
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = tx.send(SessionEvent {
                session,
                kind: SessionEventKind::Timer { kind, generation },
            });
        });
        *self.slot(kind) = Some(TimerHandle { generation, task });
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        self.slot(kind).take();
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        match kind {
            TimerKind::Silence => self.silence.is_some(),
            TimerKind::EarlyCutoff => self.early_cutoff.is_some(),
            TimerKind::NoMatch => self.no_match.is_some(),
        }
    }

    /// Consumes a fired timer. Returns false if it was cancelled or re-armed
    /// after the event was queued.
    pub fn take_fired(&mut self, kind: TimerKind, generation: u64) -> bool {
        let slot = self.slot(kind);
        if slot.as_ref().is_some_and(|t| t.generation == generation) {
            slot.take();
            true
        } else {
            false
        }
    }

    pub fn cancel_all(&mut self) {
        self.silence.take();
        self.early_cutoff.take();
        self.no_match.take();
    }
}

/// One open transcription session for one speaker.
pub struct TranscriptionSession {
    pub id: SessionId,
    pub accumulated_final_text: String,
    /// Latest partial result above the stability threshold.
    pub partial_tail: String,
    pub candidate: Option<MatchState>,
    pub opened_at: Instant,
    pub timers: Timers,
    stream: Box<dyn SpeechStream>,
    silence_sequence: u64,
}

impl TranscriptionSession {
    pub fn new(id: SessionId, stream: Box<dyn SpeechStream>, timers: Timers) -> Self {
        Self {
            id,
            accumulated_final_text: String::new(),
            partial_tail: String::new(),
            candidate: None,
            opened_at: Instant::now(),
            timers,
            stream,
            silence_sequence: 0,
        }
    }

    pub fn stream(&mut self) -> &mut dyn SpeechStream {
        self.stream.as_mut()
    }

    pub fn next_silence_sequence(&mut self) -> u64 {
        self.silence_sequence += 1;
        self.silence_sequence
    }
}

impl fmt::Debug for TranscriptionSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranscriptionSession")
            .field("id", &self.id)
            .field("accumulated_final_text", &self.accumulated_final_text)
            .field("partial_tail", &self.partial_tail)
            .field("candidate", &self.candidate)
            .field("opened_at", &self.opened_at)
            .finish_non_exhaustive()
    }
}

impl Drop for TranscriptionSession {
    fn drop(&mut self) {
        self.timers.cancel_all();
        self.stream.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timers() -> (Timers, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Timers::new(SessionId(1), tx), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_armed_timer_fires_with_identity() {
        let (mut timers, mut rx) = timers();
        timers.arm(TimerKind::NoMatch, Duration::from_millis(3000));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.session, SessionId(1));
        match event.kind {
            SessionEventKind::Timer { kind, generation } => {
                assert_eq!(kind, TimerKind::NoMatch);
                assert!(timers.take_fired(kind, generation));
                assert!(!timers.is_armed(TimerKind::NoMatch));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let (mut timers, mut rx) = timers();
        timers.arm(TimerKind::EarlyCutoff, Duration::from_millis(100));
        timers.cancel(TimerKind::EarlyCutoff);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_invalidates_queued_event() {
        let (mut timers, mut rx) = timers();
        timers.arm(TimerKind::Silence, Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(20)).await;
        let stale = rx.recv().await.unwrap();

        // Re-armed after the first instance already queued its event
        timers.arm(TimerKind::Silence, Duration::from_millis(10));
        match stale.kind {
            SessionEventKind::Timer { kind, generation } => {
                assert!(!timers.take_fired(kind, generation));
                assert!(timers.is_armed(TimerKind::Silence));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_all() {
        let (mut timers, mut rx) = timers();
        timers.arm(TimerKind::Silence, Duration::from_millis(10));
        timers.arm(TimerKind::NoMatch, Duration::from_millis(10));
        drop(timers);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }
}
