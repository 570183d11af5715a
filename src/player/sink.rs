//! Audio output collaborator.
//!
//! The sink plays one [`AudioHandle`] at a time. Pausing detaches the live
//! handle without tearing down its decode pipeline; resuming reattaches it.

use crate::error::{Result, VoiceDjError};
use crate::player::track::AudioHandle;
use crate::sync::lock;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Reported by the sink when an attached stream runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkEvent {
    Finished { handle_id: u64 },
}

pub trait AudioSink: Send + Sync {
    /// Starts `handle` from its current position, dropping whatever was attached.
    fn play(&mut self, handle: AudioHandle) -> Result<()>;

    /// Takes the attached handle out of the output, keeping it alive.
    fn detach(&mut self) -> Option<AudioHandle>;

    /// Puts a previously detached handle back on the output.
    fn reattach(&mut self, handle: AudioHandle) -> Result<()>;

    /// Drops the attached handle, if any.
    fn stop(&mut self);

    fn attached_id(&self) -> Option<u64>;
}

#[derive(Default)]
struct MockSinkState {
    attached: Option<AudioHandle>,
    history: Vec<SinkCall>,
    fail_play: bool,
}

/// Operations recorded by [`MockSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkCall {
    Play(u64),
    Detach(u64),
    Reattach(u64),
    Stop,
}

/// In-memory sink. Clones share state, so a test can keep one clone to
/// inspect and drive the sink owned by the controller.
#[derive(Clone, Default)]
pub struct MockSink {
    state: Arc<Mutex<MockSinkState>>,
    events: Option<mpsc::UnboundedSender<SinkEvent>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report end-of-stream through `events`.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<SinkEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn history(&self) -> Vec<SinkCall> {
        lock(&self.state).history.clone()
    }

    /// Make `play` reject new streams until called again with `false`.
    pub fn set_play_failure(&self, fail: bool) {
        lock(&self.state).fail_play = fail;
    }

    /// Simulates the attached stream reaching its end.
    pub fn finish_current(&self) -> Option<u64> {
        let handle = lock(&self.state).attached.take()?;
        let handle_id = handle.id();
        drop(handle);
        if let Some(events) = &self.events {
            let _ = events.send(SinkEvent::Finished { handle_id });
        }
        Some(handle_id)
    }
}

impl AudioSink for MockSink {
    fn play(&mut self, handle: AudioHandle) -> Result<()> {
        let mut state = lock(&self.state);
        if state.fail_play {
            return Err(VoiceDjError::AudioSink {
                message: format!("mock sink refused stream {}", handle.id()),
            });
        }
        state.history.push(SinkCall::Play(handle.id()));
        state.attached = Some(handle);
        Ok(())
    }

    fn detach(&mut self) -> Option<AudioHandle> {
        let mut state = lock(&self.state);
        let handle = state.attached.take()?;
        state.history.push(SinkCall::Detach(handle.id()));
        Some(handle)
    }

    fn reattach(&mut self, handle: AudioHandle) -> Result<()> {
        let mut state = lock(&self.state);
        state.history.push(SinkCall::Reattach(handle.id()));
        state.attached = Some(handle);
        Ok(())
    }

    fn stop(&mut self) {
        let mut state = lock(&self.state);
        state.history.push(SinkCall::Stop);
        state.attached = None;
    }

    fn attached_id(&self) -> Option<u64> {
        lock(&self.state).attached.as_ref().map(AudioHandle::id)
    }
}
