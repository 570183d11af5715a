//! Tracks and the audio handles that carry them.

use serde::Serialize;
use std::fmt;

/// Position in a paginated search, used to fetch the next candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchCursor {
    pub query: String,
    pub index: usize,
}

impl SearchCursor {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            index: 0,
        }
    }

    pub fn next(&self) -> Self {
        Self {
            query: self.query.clone(),
            index: self.index + 1,
        }
    }
}

/// Decoded audio behind a handle (download + transcode pipeline).
pub trait AudioStream: Send + Sync {
    /// Frees the upstream decode resources.
    fn release(&mut self);
}

/// A playable audio substream.
///
/// The handle is the unit the sink attaches and detaches. Dropping it
/// releases the underlying stream, so discarding a handle never leaks the
/// decode pipeline behind it.
pub struct AudioHandle {
    id: u64,
    stream: Box<dyn AudioStream>,
}

impl AudioHandle {
    pub fn new(id: u64, stream: Box<dyn AudioStream>) -> Self {
        Self { id, stream }
    }

    /// Stable identity, preserved across detach/reattach.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Debug for AudioHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioHandle").field("id", &self.id).finish()
    }
}

impl Drop for AudioHandle {
    fn drop(&mut self) {
        self.stream.release();
    }
}

/// A resolved search result.
#[derive(Debug)]
pub struct Track {
    /// The query this track was resolved from.
    pub query: String,
    pub resolved_id: Option<String>,
    pub title: String,
    /// Present until the track is handed to the sink.
    pub audio: Option<AudioHandle>,
    pub cursor: Option<SearchCursor>,
}

impl Track {
    pub fn info(&self) -> TrackInfo {
        TrackInfo {
            query: self.query.clone(),
            id: self.resolved_id.clone(),
            title: self.title.clone(),
        }
    }
}

/// What playback events report about a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackInfo {
    pub query: String,
    pub id: Option<String>,
    pub title: String,
}

impl fmt::Display for TrackInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{} [{}]", self.title, id),
            None => f.write_str(&self.title),
        }
    }
}
