//! Single owning task for a [`PlaybackController`].
//!
//! Every operation is a message; the task handles one at a time, so a
//! `play` can never interleave with a `pause` on the same controller.

use crate::error::{Result, VoiceDjError};
use crate::player::controller::{PlaybackController, PlaybackStatus};
use crate::player::sink::SinkEvent;
use crate::player::track::TrackInfo;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Point-in-time view of the controller state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerSnapshot {
    pub status: PlaybackStatus,
    pub current: Option<TrackInfo>,
    pub queue: Vec<String>,
    pub paused_handle: Option<u64>,
    pub playing_handle: Option<u64>,
    /// Sorted for stable output.
    pub autoplay_history: Vec<String>,
}

impl PlayerSnapshot {
    fn of(controller: &PlaybackController) -> Self {
        let mut autoplay_history: Vec<String> =
            controller.autoplay_history().iter().cloned().collect();
        autoplay_history.sort();
        Self {
            status: controller.status(),
            current: controller.current(),
            queue: controller.queue().map(str::to_string).collect(),
            paused_handle: controller.paused_handle_id(),
            playing_handle: controller.playing_handle_id(),
            autoplay_history,
        }
    }
}

enum Request {
    Play {
        query: String,
        reply: oneshot::Sender<Result<TrackInfo>>,
    },
    Add {
        query: String,
        reply: oneshot::Sender<usize>,
    },
    AddAll {
        queries: Vec<String>,
        reply: oneshot::Sender<usize>,
    },
    PlayNext {
        reply: oneshot::Sender<Result<Option<TrackInfo>>>,
    },
    PlayNextSearchResult {
        reply: oneshot::Sender<Result<TrackInfo>>,
    },
    Pause {
        reply: oneshot::Sender<bool>,
    },
    Resume {
        reply: oneshot::Sender<Result<bool>>,
    },
    ClearPaused {
        reply: oneshot::Sender<bool>,
    },
    Skip {
        reply: oneshot::Sender<Result<Option<TrackInfo>>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<PlayerSnapshot>,
    },
}

/// Cloneable handle to a running player task.
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    tx: mpsc::UnboundedSender<Request>,
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Request::Play { .. } => "Play",
            Request::Add { .. } => "Add",
            Request::AddAll { .. } => "AddAll",
            Request::PlayNext { .. } => "PlayNext",
            Request::PlayNextSearchResult { .. } => "PlayNextSearchResult",
            Request::Pause { .. } => "Pause",
            Request::Resume { .. } => "Resume",
            Request::ClearPaused { .. } => "ClearPaused",
            Request::Skip { .. } => "Skip",
            Request::Stop { .. } => "Stop",
            Request::Snapshot { .. } => "Snapshot",
        };
        f.write_str(name)
    }
}

/// Moves `controller` onto its own task.
///
/// `sink_events` carries end-of-stream notifications from the audio sink.
/// The task exits once every [`PlayerHandle`] is dropped.
pub fn spawn(
    mut controller: PlaybackController,
    mut sink_events: mpsc::UnboundedReceiver<SinkEvent>,
) -> (PlayerHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(async move {
        let mut sink_open = true;
        loop {
            tokio::select! {
                request = rx.recv() => match request {
                    Some(request) => handle(&mut controller, request).await,
                    None => break,
                },
                event = sink_events.recv(), if sink_open => match event {
                    Some(SinkEvent::Finished { handle_id }) => {
                        if let Err(e) = controller.on_track_finished(handle_id).await {
                            warn!(error = %e, "advancing after track end failed");
                        }
                    }
                    None => sink_open = false,
                },
            }
        }
        debug!("player task stopped");
    });
    (PlayerHandle { tx }, task)
}

async fn handle(controller: &mut PlaybackController, request: Request) {
    debug!(?request, "player request");
    // A dropped reply receiver just means the caller stopped waiting.
    match request {
        Request::Play { query, reply } => {
            let _ = reply.send(controller.play(&query).await);
        }
        Request::Add { query, reply } => {
            let _ = reply.send(controller.add(&query));
        }
        Request::AddAll { queries, reply } => {
            let _ = reply.send(controller.add_all(queries));
        }
        Request::PlayNext { reply } => {
            let _ = reply.send(controller.play_next().await);
        }
        Request::PlayNextSearchResult { reply } => {
            let _ = reply.send(controller.play_next_search_result().await);
        }
        Request::Pause { reply } => {
            let _ = reply.send(controller.pause());
        }
        Request::Resume { reply } => {
            let _ = reply.send(controller.resume());
        }
        Request::ClearPaused { reply } => {
            let _ = reply.send(controller.clear_paused());
        }
        Request::Skip { reply } => {
            let _ = reply.send(controller.skip().await);
        }
        Request::Stop { reply } => {
            controller.stop();
            let _ = reply.send(());
        }
        Request::Snapshot { reply } => {
            let _ = reply.send(PlayerSnapshot::of(controller));
        }
    }
}

impl PlayerHandle {
    async fn call<T>(&self, request: impl FnOnce(oneshot::Sender<T>) -> Request) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(request(reply))
            .map_err(|_| VoiceDjError::PlayerGone)?;
        rx.await.map_err(|_| VoiceDjError::PlayerGone)
    }

    pub async fn play(&self, query: &str) -> Result<TrackInfo> {
        let query = query.to_string();
        self.call(|reply| Request::Play { query, reply }).await?
    }

    pub async fn add(&self, query: &str) -> Result<usize> {
        let query = query.to_string();
        self.call(|reply| Request::Add { query, reply }).await
    }

    pub async fn add_all(&self, queries: Vec<String>) -> Result<usize> {
        self.call(|reply| Request::AddAll { queries, reply }).await
    }

    pub async fn play_next(&self) -> Result<Option<TrackInfo>> {
        self.call(|reply| Request::PlayNext { reply }).await?
    }

    pub async fn play_next_search_result(&self) -> Result<TrackInfo> {
        self.call(|reply| Request::PlayNextSearchResult { reply })
            .await?
    }

    pub async fn pause(&self) -> Result<bool> {
        self.call(|reply| Request::Pause { reply }).await
    }

    pub async fn resume(&self) -> Result<bool> {
        self.call(|reply| Request::Resume { reply }).await?
    }

    pub async fn clear_paused(&self) -> Result<bool> {
        self.call(|reply| Request::ClearPaused { reply }).await
    }

    pub async fn skip(&self) -> Result<Option<TrackInfo>> {
        self.call(|reply| Request::Skip { reply }).await?
    }

    pub async fn stop(&self) -> Result<()> {
        self.call(|reply| Request::Stop { reply }).await
    }

    pub async fn snapshot(&self) -> Result<PlayerSnapshot> {
        self.call(|reply| Request::Snapshot { reply }).await
    }
}
