//! One voice session: the speakers being listened to and the shared player.
//!
//! Every speaker gets an independent [`Listener`] task; all of them report
//! into one channel that the session drains and hands to the
//! [`Dispatcher`], one event at a time.

use crate::config::Config;
use crate::dispatch::{DispatchAction, Dispatcher};
use crate::error::Result;
use crate::recognition::command::CommandTable;
use crate::recognition::engine::{HotwordEngine, SpeechEngine};
use crate::recognition::frame::AudioFrame;
use crate::recognition::listener::{Listener, RecognitionEvent, SpeakerId};
use crate::recognition::transcriber::TranscriberConfig;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Frames buffered per speaker before the transport has to drop audio.
pub const FRAME_BUFFER: usize = 256;

/// Creates a hotword engine for each speaker that joins.
pub trait HotwordEngineFactory: Send + Sync {
    fn create(&self, speaker: &SpeakerId) -> Result<Box<dyn HotwordEngine>>;
}

impl<F> HotwordEngineFactory for F
where
    F: Fn(&SpeakerId) -> Result<Box<dyn HotwordEngine>> + Send + Sync,
{
    fn create(&self, speaker: &SpeakerId) -> Result<Box<dyn HotwordEngine>> {
        self(speaker)
    }
}

/// A registered speaker. Dropping the entry stops its listener.
struct SpeakerEntry {
    _stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Speakers currently being listened to, keyed by participant id.
#[derive(Default)]
pub struct SpeakerRegistry {
    speakers: HashMap<SpeakerId, SpeakerEntry>,
}

impl SpeakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, speaker: SpeakerId, entry: SpeakerEntry) -> Option<JoinHandle<()>> {
        self.speakers.insert(speaker, entry).map(|old| old.task)
    }

    /// Stops listening to `speaker`. Removing an unknown speaker is a no-op.
    pub fn remove(&mut self, speaker: &SpeakerId) -> Option<JoinHandle<()>> {
        self.speakers.remove(speaker).map(|entry| entry.task)
    }

    pub fn contains(&self, speaker: &SpeakerId) -> bool {
        self.speakers.contains_key(speaker)
    }

    pub fn len(&self) -> usize {
        self.speakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speakers.is_empty()
    }

    /// Registered speaker ids, sorted.
    pub fn speakers(&self) -> Vec<SpeakerId> {
        let mut ids: Vec<SpeakerId> = self.speakers.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn drain(&mut self) -> Vec<JoinHandle<()>> {
        self.speakers.drain().map(|(_, entry)| entry.task).collect()
    }
}

pub struct VoiceSession {
    bot_id: SpeakerId,
    hotwords: Arc<dyn HotwordEngineFactory>,
    speech: Arc<dyn SpeechEngine>,
    commands: CommandTable,
    transcriber: TranscriberConfig,
    registry: SpeakerRegistry,
    dispatcher: Dispatcher,
    events_tx: mpsc::UnboundedSender<RecognitionEvent>,
    events: mpsc::UnboundedReceiver<RecognitionEvent>,
}

impl VoiceSession {
    /// `bot_id` is our own participant id; it is never listened to.
    pub fn new(
        bot_id: SpeakerId,
        config: &Config,
        hotwords: Arc<dyn HotwordEngineFactory>,
        speech: Arc<dyn SpeechEngine>,
        dispatcher: Dispatcher,
    ) -> Self {
        let commands = CommandTable::new(config.commands.clone());
        let transcriber = TranscriberConfig::from_config(&config.recognition, &commands);
        let (events_tx, events) = mpsc::unbounded_channel();
        Self {
            bot_id,
            hotwords,
            speech,
            commands,
            transcriber,
            registry: SpeakerRegistry::new(),
            dispatcher,
            events_tx,
            events,
        }
    }

    pub fn registry(&self) -> &SpeakerRegistry {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Starts listening to `speaker` and returns the sender its audio goes to.
    ///
    /// Returns `None` for the bot itself. A speaker that joins twice has its
    /// previous listener stopped first.
    pub fn join(&mut self, speaker: SpeakerId) -> Result<Option<mpsc::Sender<AudioFrame>>> {
        if speaker == self.bot_id {
            debug!(%speaker, "not listening to ourselves");
            return Ok(None);
        }

        let hotword = self.hotwords.create(&speaker)?;
        let listener = Listener::new(
            speaker.clone(),
            hotword,
            Arc::clone(&self.speech),
            self.commands.clone(),
            self.transcriber.clone(),
        );
        let (frames_tx, frames) = mpsc::channel(FRAME_BUFFER);
        let (stop, stop_rx) = oneshot::channel();
        let task = tokio::spawn(listener.run(frames, stop_rx, self.events_tx.clone()));

        if self
            .registry
            .insert(speaker.clone(), SpeakerEntry { _stop: stop, task })
            .is_some()
        {
            warn!(%speaker, "speaker joined twice, previous listener stopped");
        }
        info!(%speaker, speakers = self.registry.len(), "speaker joined");
        Ok(Some(frames_tx))
    }

    /// Stops listening to `speaker`. Returns false if it was not registered.
    pub async fn leave(&mut self, speaker: &SpeakerId) -> bool {
        let Some(task) = self.registry.remove(speaker) else {
            debug!(%speaker, "leave for unknown speaker");
            return false;
        };
        if let Err(e) = task.await {
            warn!(%speaker, error = %e, "listener task failed");
        }
        info!(%speaker, speakers = self.registry.len(), "speaker left");
        true
    }

    /// Waits for the next recognition event from any speaker.
    pub async fn next_event(&mut self) -> Option<RecognitionEvent> {
        self.events.recv().await
    }

    /// Dispatches one event; tears the session down on `leave`.
    pub async fn handle_event(&mut self, event: RecognitionEvent) -> Result<DispatchAction> {
        let action = self.dispatcher.dispatch(event).await?;
        if action == DispatchAction::Leave {
            self.disconnect().await?;
        }
        Ok(action)
    }

    /// Dispatches events until a `leave` command.
    pub async fn run(&mut self) -> Result<()> {
        while let Some(event) = self.next_event().await {
            if self.handle_event(event).await? == DispatchAction::Leave {
                break;
            }
        }
        Ok(())
    }

    /// Stops every listener and ends playback.
    pub async fn disconnect(&mut self) -> Result<()> {
        for task in self.registry.drain() {
            if let Err(e) = task.await {
                warn!(error = %e, "listener task failed");
            }
        }
        // Anything the listeners reported while shutting down is moot now
        while self.events.try_recv().is_ok() {}
        self.dispatcher.player().stop().await?;
        info!("voice session disconnected");
        Ok(())
    }
}
