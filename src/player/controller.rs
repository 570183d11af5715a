//! Playback controller: queue, current track, pause/resume and autoplay.
//!
//! State invariants:
//! - a paused handle is held iff the status is `Paused`
//! - autoplay history is cleared by every manual play, skip and stop, and
//!   only grows while autoplay keeps choosing tracks
//!
//! The controller is not synchronized; [`crate::player::actor`] gives it a
//! single owning task so operations never interleave.

use crate::config::PlaybackConfig;
use crate::error::{Result, VoiceDjError};
use crate::player::resolver::TrackResolver;
use crate::player::sink::AudioSink;
use crate::player::track::{AudioHandle, Track, TrackInfo};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    Idle,
    Playing,
    Paused,
    Stopped,
}

/// Playback notifications for the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlaybackEvent {
    /// A track started.
    Song { track: TrackInfo },
    /// Nothing left to play.
    End,
    /// A resolution or output failure; playback carried on.
    Error {
        message: String,
        query: Option<String>,
    },
}

pub struct PlaybackController {
    resolver: Arc<dyn TrackResolver>,
    sink: Box<dyn AudioSink>,
    config: PlaybackConfig,
    events: mpsc::UnboundedSender<PlaybackEvent>,
    status: PlaybackStatus,
    queue: VecDeque<String>,
    current: Option<Track>,
    paused: Option<AudioHandle>,
    /// Handle the sink is playing on our behalf.
    playing: Option<u64>,
    autoplay_history: HashSet<String>,
}

impl PlaybackController {
    pub fn new(
        resolver: Arc<dyn TrackResolver>,
        sink: Box<dyn AudioSink>,
        config: PlaybackConfig,
        events: mpsc::UnboundedSender<PlaybackEvent>,
    ) -> Self {
        Self {
            resolver,
            sink,
            config,
            events,
            status: PlaybackStatus::Idle,
            queue: VecDeque::new(),
            current: None,
            paused: None,
            playing: None,
            autoplay_history: HashSet::new(),
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn queue(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(String::as_str)
    }

    pub fn current(&self) -> Option<TrackInfo> {
        self.current.as_ref().map(Track::info)
    }

    pub fn paused_handle_id(&self) -> Option<u64> {
        self.paused.as_ref().map(AudioHandle::id)
    }

    pub fn playing_handle_id(&self) -> Option<u64> {
        self.playing
    }

    pub fn autoplay_history(&self) -> &HashSet<String> {
        &self.autoplay_history
    }

    /// Resolves `query` and plays it right away, discarding the current
    /// stream and any held pause. A held pause and the autoplay history are
    /// only dropped once the new track is on the sink.
    pub async fn play(&mut self, query: &str) -> Result<TrackInfo> {
        info!(%query, "play");
        let track = match self.resolver.resolve(query).await {
            Ok(track) => track,
            Err(e) => return Err(self.report(e, Some(query))),
        };

        let info = self.start(track)?;
        self.autoplay_history.clear();
        self.discard_paused();
        Ok(info)
    }

    /// Appends `query` to the queue unresolved. Returns the queue length.
    pub fn add(&mut self, query: &str) -> usize {
        self.queue.push_back(query.to_string());
        debug!(%query, queued = self.queue.len(), "queued");
        self.queue.len()
    }

    /// Appends several queries in order, e.g. a playlist.
    pub fn add_all(&mut self, queries: impl IntoIterator<Item = String>) -> usize {
        self.queue.extend(queries);
        debug!(queued = self.queue.len(), "queued batch");
        self.queue.len()
    }

    /// Resumes a held pause if there is one; otherwise plays the next
    /// queued query, falling back to autoplay. Returns `None` when playback
    /// ended.
    pub async fn play_next(&mut self) -> Result<Option<TrackInfo>> {
        if self.paused.is_some() {
            debug!("play next: resuming held pause");
            self.resume()?;
            return Ok(self.current());
        }
        self.advance().await
    }

    /// Replaces the current track with the next result of its search,
    /// skipping tracks autoplay already chose.
    pub async fn play_next_search_result(&mut self) -> Result<TrackInfo> {
        let resolver = Arc::clone(&self.resolver);
        let Some(current) = self.current.as_ref() else {
            return Err(self.report(VoiceDjError::NothingPlaying, None));
        };
        let query = current.query.clone();

        let mut candidate = resolver.resolve_next(current).await;
        while let Ok(track) = &candidate
            && track
                .resolved_id
                .as_ref()
                .is_some_and(|id| self.autoplay_history.contains(id))
        {
            debug!(id = ?track.resolved_id, "skipping result already autoplayed");
            candidate = resolver.resolve_next(track).await;
        }

        match candidate {
            Ok(track) => {
                let info = self.start(track)?;
                self.discard_paused();
                Ok(info)
            }
            Err(e) => Err(self.report(e, Some(&query))),
        }
    }

    /// Detaches the live stream into the paused slot. Returns false (no-op)
    /// unless currently playing.
    pub fn pause(&mut self) -> bool {
        if self.status != PlaybackStatus::Playing {
            debug!(status = ?self.status, "can't pause, not playing");
            return false;
        }
        let Some(handle) = self.sink.detach() else {
            warn!("sink had nothing attached while playing");
            self.playing = None;
            self.status = PlaybackStatus::Stopped;
            return false;
        };

        debug!(handle = handle.id(), "paused");
        self.playing = None;
        self.paused = Some(handle);
        self.status = PlaybackStatus::Paused;
        true
    }

    /// Reattaches the held pause. Returns false (no-op) unless paused.
    pub fn resume(&mut self) -> Result<bool> {
        if self.status == PlaybackStatus::Playing {
            debug!("can't resume, already playing");
            return Ok(false);
        }
        let Some(handle) = self.paused.take() else {
            debug!("can't resume, nothing paused");
            return Ok(false);
        };

        let id = handle.id();
        if let Err(e) = self.sink.reattach(handle) {
            self.status = PlaybackStatus::Stopped;
            return Err(self.report(e, None));
        }
        debug!(handle = id, "resumed");
        self.playing = Some(id);
        self.status = PlaybackStatus::Playing;
        Ok(true)
    }

    /// Drops a held pause without resuming it. Returns whether one was held.
    pub fn clear_paused(&mut self) -> bool {
        let cleared = self.discard_paused();
        if cleared {
            debug!("paused track discarded");
        }
        cleared
    }

    /// Discards the current or paused track and advances.
    pub async fn skip(&mut self) -> Result<Option<TrackInfo>> {
        info!("skip");
        self.autoplay_history.clear();
        self.discard_paused();
        self.sink.stop();
        self.playing = None;
        self.advance().await
    }

    /// Ends playback and forgets the queue.
    pub fn stop(&mut self) {
        info!("stop");
        self.queue.clear();
        self.autoplay_history.clear();
        self.paused = None;
        self.sink.stop();
        self.playing = None;
        self.current = None;
        self.status = PlaybackStatus::Stopped;
        let _ = self.events.send(PlaybackEvent::End);
    }

    /// The sink finished a stream. Ignored unless it is the one we are playing.
    pub async fn on_track_finished(&mut self, handle_id: u64) -> Result<Option<TrackInfo>> {
        if self.playing != Some(handle_id) {
            debug!(handle = handle_id, playing = ?self.playing, "stale track-finished, ignoring");
            return Ok(None);
        }
        debug!(handle = handle_id, "track finished");
        self.playing = None;
        self.advance().await
    }

    /// Plays the next queued query, skipping ones that fail to resolve.
    async fn advance(&mut self) -> Result<Option<TrackInfo>> {
        while let Some(query) = self.queue.pop_front() {
            match self.resolver.resolve(&query).await {
                Ok(track) => {
                    self.autoplay_history.clear();
                    return self.start(track).map(Some);
                }
                Err(e) => {
                    self.report(e, Some(&query));
                }
            }
        }

        if self.config.autoplay
            && let Some(track) = self.autoplay().await
        {
            return self.start(track).map(Some);
        }

        self.end();
        Ok(None)
    }

    /// Picks a track related to the current one that autoplay has not
    /// played in this chain.
    async fn autoplay(&mut self) -> Option<Track> {
        let resolver = Arc::clone(&self.resolver);
        let seed = self.current.as_ref()?;
        if let Some(id) = &seed.resolved_id {
            self.autoplay_history.insert(id.clone());
        }
        info!(seed = %seed.info(), "autoplaying");

        let mut candidate = match resolver.resolve_related(seed).await {
            Ok(track) => track,
            Err(e) => {
                let query = seed.query.clone();
                self.report(e, Some(&query));
                return None;
            }
        };

        for _ in 0..self.config.autoplay_max_attempts {
            match &candidate.resolved_id {
                Some(id) if !self.autoplay_history.contains(id) => {
                    self.autoplay_history.insert(id.clone());
                    return Some(candidate);
                }
                id => debug!(?id, "autoplay candidate already played"),
            }
            candidate = match resolver.resolve_next(&candidate).await {
                Ok(track) => track,
                Err(e) => {
                    debug!(error = %e, "autoplay ran out of candidates");
                    return None;
                }
            };
        }

        warn!(
            attempts = self.config.autoplay_max_attempts,
            "autoplay gave up"
        );
        None
    }

    fn start(&mut self, mut track: Track) -> Result<TrackInfo> {
        let info = track.info();
        let Some(handle) = track.audio.take() else {
            let e = VoiceDjError::Download {
                message: format!("no audio for '{}'", track.query),
            };
            return Err(self.report(e, Some(&info.query)));
        };

        let id = handle.id();
        if let Err(e) = self.sink.play(handle) {
            // A held pause is still intact; anything live is gone
            if self.status != PlaybackStatus::Paused {
                self.sink.stop();
                self.playing = None;
                self.status = PlaybackStatus::Stopped;
            }
            return Err(self.report(e, Some(&info.query)));
        }

        info!(track = %info, handle = id, "playing");
        self.playing = Some(id);
        self.current = Some(track);
        self.status = PlaybackStatus::Playing;
        let _ = self.events.send(PlaybackEvent::Song {
            track: info.clone(),
        });
        Ok(info)
    }

    fn end(&mut self) {
        info!("end of playback");
        self.sink.stop();
        self.playing = None;
        self.status = PlaybackStatus::Stopped;
        let _ = self.events.send(PlaybackEvent::End);
    }

    fn discard_paused(&mut self) -> bool {
        let held = self.paused.take().is_some();
        if held && self.status == PlaybackStatus::Paused {
            self.status = PlaybackStatus::Stopped;
        }
        held
    }

    /// Emits an error event and hands the error back.
    fn report(&self, error: VoiceDjError, query: Option<&str>) -> VoiceDjError {
        warn!(error = %error, query = ?query, "playback error");
        let _ = self.events.send(PlaybackEvent::Error {
            message: error.to_string(),
            query: query.map(str::to_string),
        });
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::resolver::MockResolver;
    use crate::player::sink::{MockSink, SinkCall};

    struct Fixture {
        controller: PlaybackController,
        sink: MockSink,
        resolver: MockResolver,
        events: mpsc::UnboundedReceiver<PlaybackEvent>,
    }

    impl Fixture {
        fn drain(&mut self) -> Vec<PlaybackEvent> {
            let mut out = Vec::new();
            while let Ok(event) = self.events.try_recv() {
                out.push(event);
            }
            out
        }
    }

    fn fixture_with(resolver: MockResolver, autoplay: bool) -> Fixture {
        let sink = MockSink::new();
        let (tx, events) = mpsc::unbounded_channel();
        let config = PlaybackConfig {
            autoplay,
            ..PlaybackConfig::default()
        };
        let controller = PlaybackController::new(
            Arc::new(resolver.clone()),
            Box::new(sink.clone()),
            config,
            tx,
        );
        Fixture {
            controller,
            sink,
            resolver,
            events,
        }
    }

    fn fixture(autoplay: bool) -> Fixture {
        fixture_with(
            MockResolver::new()
                .with_results("song a", &["a"])
                .with_results("song b", &["b"])
                .with_results("x", &["x1", "x2"])
                .with_results("y", &["y1"]),
            autoplay,
        )
    }

    fn assert_invariants(c: &PlaybackController) {
        assert_eq!(
            c.paused_handle_id().is_some(),
            c.status() == PlaybackStatus::Paused
        );
        if c.status() == PlaybackStatus::Playing {
            assert!(c.playing_handle_id().is_some());
        }
    }

    #[tokio::test]
    async fn test_queue_then_end() {
        let mut f = fixture(false);
        f.controller.add("song a");
        f.controller.add("song b");
        assert_eq!(f.controller.status(), PlaybackStatus::Idle);

        let first = f.controller.play_next().await.unwrap().unwrap();
        assert_eq!(first.id.as_deref(), Some("a"));
        let second = f.controller.play_next().await.unwrap().unwrap();
        assert_eq!(second.id.as_deref(), Some("b"));

        assert_eq!(f.controller.play_next().await.unwrap(), None);
        assert_eq!(f.controller.status(), PlaybackStatus::Stopped);
        assert_eq!(f.drain().last(), Some(&PlaybackEvent::End));
        assert_invariants(&f.controller);
    }

    #[tokio::test]
    async fn test_play_discards_current_stream() {
        let mut f = fixture(true);
        f.controller.play("y").await.unwrap();
        let y_handle = f.controller.playing_handle_id().unwrap();

        let info = f.controller.play("x").await.unwrap();
        assert_eq!(info.id.as_deref(), Some("x1"));
        assert_eq!(f.controller.current().unwrap().query, "x");
        assert!(f.controller.autoplay_history().is_empty());
        assert!(f.resolver.released().contains(&y_handle));
        assert_eq!(f.controller.paused_handle_id(), None);
    }

    #[tokio::test]
    async fn test_play_not_found_leaves_state() {
        let mut f = fixture(true);
        f.controller.play("y").await.unwrap();
        assert!(f.controller.pause());
        f.drain();

        let err = f.controller.play("unknown").await.unwrap_err();
        assert!(err.is_resolution());
        assert_eq!(f.controller.status(), PlaybackStatus::Paused);
        assert!(f.controller.paused_handle_id().is_some());
        assert!(matches!(
            f.drain().as_slice(),
            [PlaybackEvent::Error { query: Some(q), .. }] if q == "unknown"
        ));
    }

    #[tokio::test]
    async fn test_pause_is_idempotent() {
        let mut f = fixture(true);
        f.controller.play("y").await.unwrap();

        assert!(f.controller.pause());
        let paused = f.controller.paused_handle_id();
        assert!(!f.controller.pause());
        assert_eq!(f.controller.paused_handle_id(), paused);
        assert_eq!(f.controller.status(), PlaybackStatus::Paused);
        assert_invariants(&f.controller);
    }

    #[tokio::test]
    async fn test_pause_when_idle_is_noop() {
        let mut f = fixture(true);
        assert!(!f.controller.pause());
        assert_eq!(f.controller.status(), PlaybackStatus::Idle);
        assert!(!f.controller.resume().unwrap());
    }

    #[tokio::test]
    async fn test_resume_pause_preserves_handle() {
        let mut f = fixture(true);
        f.controller.play("y").await.unwrap();
        let original = f.controller.playing_handle_id().unwrap();

        assert!(f.controller.pause());
        assert!(f.controller.resume().unwrap());
        assert_eq!(f.controller.status(), PlaybackStatus::Playing);
        assert!(!f.controller.resume().unwrap());
        assert!(f.controller.pause());

        assert_eq!(f.controller.paused_handle_id(), Some(original));
        assert!(f.resolver.released().is_empty());
        assert_eq!(
            f.sink.history(),
            vec![
                SinkCall::Play(original),
                SinkCall::Detach(original),
                SinkCall::Reattach(original),
                SinkCall::Detach(original),
            ]
        );
    }

    #[tokio::test]
    async fn test_play_next_prefers_held_pause() {
        let mut f = fixture(true);
        f.controller.play("y").await.unwrap();
        let held = f.controller.playing_handle_id().unwrap();
        f.controller.add("song a");
        f.controller.pause();

        let info = f.controller.play_next().await.unwrap().unwrap();
        assert_eq!(info.query, "y");
        assert_eq!(f.controller.playing_handle_id(), Some(held));
        assert_eq!(f.controller.queue().collect::<Vec<_>>(), vec!["song a"]);
    }

    #[tokio::test]
    async fn test_clear_paused_releases_handle() {
        let mut f = fixture(true);
        f.controller.play("y").await.unwrap();
        let held = f.controller.playing_handle_id().unwrap();
        f.controller.pause();

        assert!(f.controller.clear_paused());
        assert!(!f.controller.clear_paused());
        assert_eq!(f.controller.status(), PlaybackStatus::Stopped);
        assert_eq!(f.resolver.released(), vec![held]);
        assert!(!f.controller.resume().unwrap());
        assert_invariants(&f.controller);
    }

    #[tokio::test]
    async fn test_skip_discards_pause_and_advances() {
        let mut f = fixture(false);
        f.controller.play("y").await.unwrap();
        f.controller.add("song a");
        f.controller.pause();

        let info = f.controller.skip().await.unwrap().unwrap();
        assert_eq!(info.id.as_deref(), Some("a"));
        assert_eq!(f.controller.paused_handle_id(), None);
        assert_eq!(f.controller.status(), PlaybackStatus::Playing);
    }

    #[tokio::test]
    async fn test_stop_clears_everything() {
        let mut f = fixture(true);
        f.controller.play("y").await.unwrap();
        f.controller.add("song a");
        f.controller.pause();
        f.drain();

        f.controller.stop();
        assert_eq!(f.controller.status(), PlaybackStatus::Stopped);
        assert_eq!(f.controller.queue().count(), 0);
        assert_eq!(f.controller.current(), None);
        assert_eq!(f.controller.paused_handle_id(), None);
        assert!(f.controller.autoplay_history().is_empty());
        assert_eq!(f.sink.attached_id(), None);
        assert_eq!(f.drain(), vec![PlaybackEvent::End]);
    }

    #[tokio::test]
    async fn test_resolution_failure_advances_queue() {
        let resolver = MockResolver::new()
            .with_results("good", &["g"])
            .with_results("broken", &["b"])
            .with_failure("broken");
        let mut f = fixture_with(resolver, false);
        f.controller.add("missing");
        f.controller.add("broken");
        f.controller.add("good");

        let info = f.controller.play_next().await.unwrap().unwrap();
        assert_eq!(info.id.as_deref(), Some("g"));
        let errors: Vec<_> = f
            .drain()
            .into_iter()
            .filter(|e| matches!(e, PlaybackEvent::Error { .. }))
            .collect();
        assert_eq!(errors.len(), 2);
    }

    #[tokio::test]
    async fn test_autoplay_never_repeats_within_chain() {
        let resolver = MockResolver::new()
            .with_results("seed", &["s"])
            .with_related("s", &["s", "t"])
            .with_related("t", &["s", "t", "u"])
            .with_related("u", &["t", "s"]);
        let mut f = fixture_with(resolver, true);
        f.controller.play("seed").await.unwrap();

        let t = f.controller.play_next().await.unwrap().unwrap();
        assert_eq!(t.id.as_deref(), Some("t"));
        let u = f.controller.play_next().await.unwrap().unwrap();
        assert_eq!(u.id.as_deref(), Some("u"));

        // Every related candidate of "u" was already played in this chain
        assert_eq!(f.controller.play_next().await.unwrap(), None);
        assert_eq!(f.controller.status(), PlaybackStatus::Stopped);
        let history = f.controller.autoplay_history();
        assert!(["s", "t", "u"].iter().all(|id| history.contains(*id)));

        f.controller.play("seed").await.unwrap();
        assert!(f.controller.autoplay_history().is_empty());
    }

    #[tokio::test]
    async fn test_autoplay_disabled_ends() {
        let resolver = MockResolver::new()
            .with_results("seed", &["s"])
            .with_related("s", &["t"]);
        let mut f = fixture_with(resolver, false);
        f.controller.play("seed").await.unwrap();

        assert_eq!(f.controller.play_next().await.unwrap(), None);
        assert_eq!(f.controller.status(), PlaybackStatus::Stopped);
    }

    #[tokio::test]
    async fn test_next_search_result() {
        let mut f = fixture(true);
        f.controller.play("x").await.unwrap();

        let next = f.controller.play_next_search_result().await.unwrap();
        assert_eq!(next.id.as_deref(), Some("x2"));

        let err = f.controller.play_next_search_result().await.unwrap_err();
        assert!(matches!(err, VoiceDjError::SearchExhausted { .. }));
        // Still playing the last good result
        assert_eq!(f.controller.current().unwrap().id.as_deref(), Some("x2"));
    }

    #[tokio::test]
    async fn test_next_search_result_skips_autoplayed_tracks() {
        let resolver = MockResolver::new()
            .with_results("s", &["s1"])
            .with_related("s1", &["t"])
            .with_related("t", &["u", "t", "s1", "w"]);
        let mut f = fixture_with(resolver, true);
        f.controller.play("s").await.unwrap();

        let handle = f.controller.playing_handle_id().unwrap();
        let t = f.controller.on_track_finished(handle).await.unwrap().unwrap();
        assert_eq!(t.id.as_deref(), Some("t"));
        let handle = f.controller.playing_handle_id().unwrap();
        let u = f.controller.on_track_finished(handle).await.unwrap().unwrap();
        assert_eq!(u.id.as_deref(), Some("u"));

        // "t" and "s1" follow "u" in the related results but were already played
        let next = f.controller.play_next_search_result().await.unwrap();
        assert_eq!(next.id.as_deref(), Some("w"));
        assert_invariants(&f.controller);
    }

    #[tokio::test]
    async fn test_play_rejected_by_sink_keeps_pause_and_history() {
        let resolver = MockResolver::new()
            .with_results("s", &["s1"])
            .with_results("y", &["y1"])
            .with_related("s1", &["t"]);
        let mut f = fixture_with(resolver, true);
        f.controller.play("s").await.unwrap();
        let handle = f.controller.playing_handle_id().unwrap();
        f.controller.on_track_finished(handle).await.unwrap().unwrap();
        assert!(f.controller.pause());
        let paused = f.controller.paused_handle_id();
        f.drain();

        f.sink.set_play_failure(true);
        let err = f.controller.play("y").await.unwrap_err();
        assert!(matches!(err, VoiceDjError::AudioSink { .. }));
        assert_eq!(f.controller.status(), PlaybackStatus::Paused);
        assert_eq!(f.controller.paused_handle_id(), paused);
        assert_eq!(f.controller.current().unwrap().id.as_deref(), Some("t"));
        assert!(f.controller.autoplay_history().contains("t"));
        assert!(matches!(
            f.drain().as_slice(),
            [PlaybackEvent::Error { query: Some(q), .. }] if q == "y"
        ));
        assert_invariants(&f.controller);

        f.sink.set_play_failure(false);
        assert!(f.controller.resume().unwrap());
        assert_eq!(f.controller.playing_handle_id(), paused);
    }

    #[tokio::test]
    async fn test_play_rejected_by_sink_while_playing_stops() {
        let mut f = fixture(false);
        f.controller.play("x").await.unwrap();
        f.sink.set_play_failure(true);

        assert!(f.controller.play("y").await.is_err());
        assert_eq!(f.controller.status(), PlaybackStatus::Stopped);
        assert_eq!(f.controller.playing_handle_id(), None);
        assert_invariants(&f.controller);
    }

    #[tokio::test]
    async fn test_next_search_result_needs_a_track() {
        let mut f = fixture(true);
        assert!(matches!(
            f.controller.play_next_search_result().await,
            Err(VoiceDjError::NothingPlaying)
        ));
    }

    #[tokio::test]
    async fn test_track_finished_advances_and_ignores_stale() {
        let mut f = fixture(false);
        f.controller.play("y").await.unwrap();
        let y = f.controller.playing_handle_id().unwrap();
        f.controller.add("song a");

        assert_eq!(f.controller.on_track_finished(y + 100).await.unwrap(), None);
        assert_eq!(f.controller.current().unwrap().query, "y");

        let next = f.controller.on_track_finished(y).await.unwrap().unwrap();
        assert_eq!(next.query, "song a");
        // A repeat of the same notification is stale now
        assert_eq!(f.controller.on_track_finished(y).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_add_does_not_start_playback() {
        let mut f = fixture(true);
        assert_eq!(f.controller.add("song a"), 1);
        assert_eq!(
            f.controller
                .add_all(vec!["song b".to_string(), "x".to_string()]),
            3
        );
        assert_eq!(f.controller.status(), PlaybackStatus::Idle);
        assert!(f.drain().is_empty());
    }
}
