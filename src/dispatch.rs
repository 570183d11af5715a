//! Maps recognition events onto playback operations.
//!
//! A hotword pauses whatever is playing so the speaker can be heard. That
//! pause is remembered as automatic: a bad command, or a command that does
//! not replace the track, resumes it again.

use crate::error::{Result, VoiceDjError};
use crate::player::actor::PlayerHandle;
use crate::player::controller::PlaybackStatus;
use crate::player::playlist::{PlaylistProvider, extract_playlist_id};
use crate::recognition::listener::RecognitionEvent;
use crate::sync::lock;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Short feedback sounds played to the voice channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    Wake,
    Success,
    Failure,
}

pub trait CuePlayer: Send + Sync {
    fn play(&self, cue: Cue);
}

/// Plays nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentCues;

impl CuePlayer for SilentCues {
    fn play(&self, _cue: Cue) {}
}

/// Remembers every cue, for tests and the simulator.
#[derive(Debug, Clone, Default)]
pub struct RecordingCues {
    cues: Arc<Mutex<Vec<Cue>>>,
}

impl RecordingCues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> Vec<Cue> {
        lock(&self.cues).clone()
    }

    pub fn take(&self) -> Vec<Cue> {
        std::mem::take(&mut *lock(&self.cues))
    }
}

impl CuePlayer for RecordingCues {
    fn play(&self, cue: Cue) {
        lock(&self.cues).push(cue);
    }
}

/// What the voice session should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchAction {
    Continue,
    /// Leave the voice channel.
    Leave,
}

pub struct Dispatcher {
    player: PlayerHandle,
    cues: Arc<dyn CuePlayer>,
    playlists: Option<Arc<dyn PlaylistProvider>>,
    auto_paused: bool,
}

impl Dispatcher {
    pub fn new(player: PlayerHandle, cues: Arc<dyn CuePlayer>) -> Self {
        Self {
            player,
            cues,
            playlists: None,
            auto_paused: false,
        }
    }

    /// Expand playlist links given to `play` and `add`
    pub fn with_playlists(mut self, provider: Arc<dyn PlaylistProvider>) -> Self {
        self.playlists = Some(provider);
        self
    }

    pub fn player(&self) -> &PlayerHandle {
        &self.player
    }

    /// Whether the current pause was made by a hotword.
    pub fn is_auto_paused(&self) -> bool {
        self.auto_paused
    }

    /// Handles one recognition event.
    ///
    /// Only a vanished player task is an error; everything else is reported
    /// with a failure cue.
    pub async fn dispatch(&mut self, event: RecognitionEvent) -> Result<DispatchAction> {
        match event {
            RecognitionEvent::Hotword { speaker } => {
                debug!(%speaker, "hotword");
                if self.player.pause().await? {
                    self.auto_paused = true;
                }
                self.cues.play(Cue::Wake);
                Ok(DispatchAction::Continue)
            }
            RecognitionEvent::Command {
                speaker,
                name,
                argument,
            } => {
                info!(%speaker, command = %name, %argument, "command");
                self.cues.play(Cue::Success);
                self.command(&name, &argument).await
            }
            RecognitionEvent::BadCommand { speaker, text } => {
                info!(%speaker, %text, "bad command");
                self.cues.play(Cue::Failure);
                self.resume_auto_paused().await?;
                Ok(DispatchAction::Continue)
            }
        }
    }

    /// Runs a command by name. Also the entry point for typed commands,
    /// whose arguments keep their original case (playlist links).
    pub async fn command(&mut self, name: &str, argument: &str) -> Result<DispatchAction> {
        match name {
            "play" => {
                let result = self.play(argument).await;
                self.settle(result).await?;
            }
            "add" => {
                let result = self.add(argument).await;
                self.settle(result).await?;
            }
            "pause" => {
                // Already paused by the hotword; keep it that way
                self.auto_paused = false;
                self.player.pause().await?;
            }
            "resume" => {
                let result = self.player.resume().await;
                self.settle(result).await?;
            }
            "skip" => {
                let result = self.player.skip().await;
                self.settle(result).await?;
            }
            "stop" => {
                self.auto_paused = false;
                self.player.stop().await?;
            }
            "next result" => {
                let result = self.player.play_next_search_result().await;
                self.settle(result).await?;
            }
            "leave" => {
                self.auto_paused = false;
                self.player.stop().await?;
                return Ok(DispatchAction::Leave);
            }
            other => {
                debug!(command = other, "command not implemented");
                self.resume_auto_paused().await?;
            }
        }
        Ok(DispatchAction::Continue)
    }

    async fn play(&mut self, argument: &str) -> Result<()> {
        match self.playlist_queries(argument).await? {
            Some(queries) => {
                let mut queries = queries.into_iter();
                let first = queries.next().ok_or_else(|| VoiceDjError::TrackNotFound {
                    query: argument.to_string(),
                })?;
                self.player.play(&first).await?;
                self.player.add_all(queries.collect()).await?;
            }
            None => {
                self.player.play(argument).await?;
            }
        }
        Ok(())
    }

    /// Queues, then starts playback if nothing is playing or paused.
    async fn add(&mut self, argument: &str) -> Result<()> {
        match self.playlist_queries(argument).await? {
            Some(queries) => self.player.add_all(queries).await?,
            None => self.player.add(argument).await?,
        };

        match self.player.snapshot().await?.status {
            PlaybackStatus::Idle | PlaybackStatus::Stopped => {
                self.player.play_next().await?;
            }
            PlaybackStatus::Paused => self.resume_auto_paused().await?,
            PlaybackStatus::Playing => {}
        }
        Ok(())
    }

    async fn playlist_queries(&self, argument: &str) -> Result<Option<Vec<String>>> {
        let (Some(provider), Some(id)) = (&self.playlists, extract_playlist_id(argument)) else {
            return Ok(None);
        };
        debug!(playlist = id, "expanding playlist");
        provider.tracks(id).await.map(Some)
    }

    /// Reports a failed command; a vanished player stays an error.
    async fn settle<T>(&mut self, result: Result<T>) -> Result<()> {
        match result {
            Ok(_) => {
                self.auto_paused = false;
                Ok(())
            }
            Err(VoiceDjError::PlayerGone) => Err(VoiceDjError::PlayerGone),
            Err(e) => {
                warn!(error = %e, "command failed");
                self.cues.play(Cue::Failure);
                self.resume_auto_paused().await
            }
        }
    }

    async fn resume_auto_paused(&mut self) -> Result<()> {
        if std::mem::take(&mut self.auto_paused) {
            debug!("resuming track paused by hotword");
            self.player.resume().await?;
        }
        Ok(())
    }
}
