//! Track resolver: free-text query to playable track.

use crate::error::{Result, VoiceDjError};
use crate::player::track::{AudioHandle, AudioStream, SearchCursor, Track};
use crate::sync::lock;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Search backend plus audio download.
///
/// Resolution errors (`TrackNotFound`, `SearchExhausted`, `Download`) are
/// expected and never fatal to the caller.
#[async_trait::async_trait]
pub trait TrackResolver: Send + Sync {
    /// First search result for `query`.
    async fn resolve(&self, query: &str) -> Result<Track>;

    /// Next candidate after `track` in the same search.
    async fn resolve_next(&self, track: &Track) -> Result<Track>;

    /// A track related to `track`, for autoplay. Its cursor walks the other
    /// related candidates through [`TrackResolver::resolve_next`].
    async fn resolve_related(&self, track: &Track) -> Result<Track>;
}

const RELATED_PREFIX: &str = "related:";
const SYNTHETIC_RESULTS: usize = 3;

#[derive(Default)]
struct MockResolverState {
    results: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    next_handle: u64,
    resolved: Vec<String>,
}

struct MockStream {
    id: u64,
    released: Arc<Mutex<Vec<u64>>>,
}

impl AudioStream for MockStream {
    fn release(&mut self) {
        lock(&self.released).push(self.id);
    }
}

/// Resolver backed by canned result lists.
///
/// In synthetic mode every query resolves, which is what the `simulate`
/// command uses.
#[derive(Clone, Default)]
pub struct MockResolver {
    state: Arc<Mutex<MockResolverState>>,
    released: Arc<Mutex<Vec<u64>>>,
    synthetic: bool,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve any query to generated results
    pub fn synthetic() -> Self {
        Self {
            synthetic: true,
            ..Self::default()
        }
    }

    /// Search results for `query`, in ranking order
    pub fn with_results(self, query: &str, ids: &[&str]) -> Self {
        lock(&self.state).results.insert(
            query.to_string(),
            ids.iter().map(|id| id.to_string()).collect(),
        );
        self
    }

    /// Related tracks for autoplay seeded by `id`
    pub fn with_related(self, id: &str, ids: &[&str]) -> Self {
        self.with_results(&format!("{RELATED_PREFIX}{id}"), ids)
    }

    /// Make downloads for `query` fail
    pub fn with_failure(self, query: &str) -> Self {
        lock(&self.state).failing.insert(query.to_string());
        self
    }

    /// Handle ids whose streams have been released.
    pub fn released(&self) -> Vec<u64> {
        lock(&self.released).clone()
    }

    /// Every key looked up, in order.
    pub fn resolved(&self) -> Vec<String> {
        lock(&self.state).resolved.clone()
    }

    fn lookup(&self, key: &str, cursor: SearchCursor) -> Result<Option<Track>> {
        let mut state = lock(&self.state);
        state.resolved.push(key.to_string());
        if state.failing.contains(key) {
            return Err(VoiceDjError::Download {
                message: format!("mock download failure for '{key}'"),
            });
        }

        let id = match state.results.get(key) {
            Some(ids) => ids.get(cursor.index).cloned(),
            None if self.synthetic => synthetic_id(key, cursor.index),
            None => None,
        };
        let Some(id) = id else {
            return Ok(None);
        };

        state.next_handle += 1;
        let stream = MockStream {
            id: state.next_handle,
            released: Arc::clone(&self.released),
        };
        Ok(Some(Track {
            query: key.to_string(),
            title: title_for(key, &id),
            resolved_id: Some(id),
            audio: Some(AudioHandle::new(state.next_handle, Box::new(stream))),
            cursor: Some(cursor),
        }))
    }
}

fn synthetic_id(key: &str, index: usize) -> Option<String> {
    if index >= SYNTHETIC_RESULTS {
        return None;
    }
    let base = match key.strip_prefix(RELATED_PREFIX) {
        Some(seed) => seed.to_string(),
        None => key
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("-"),
    };
    Some(format!("{base}.{}", index + 1))
}

fn title_for(key: &str, id: &str) -> String {
    match key.strip_prefix(RELATED_PREFIX) {
        Some(seed) => format!("{id} (related to {seed})"),
        None => format!("{key} ({id})"),
    }
}

#[async_trait::async_trait]
impl TrackResolver for MockResolver {
    async fn resolve(&self, query: &str) -> Result<Track> {
        self.lookup(query, SearchCursor::new(query))?
            .ok_or_else(|| VoiceDjError::TrackNotFound {
                query: query.to_string(),
            })
    }

    async fn resolve_next(&self, track: &Track) -> Result<Track> {
        let exhausted = || VoiceDjError::SearchExhausted {
            query: track.query.clone(),
        };
        let cursor = track.cursor.as_ref().ok_or_else(exhausted)?.next();
        self.lookup(&cursor.query.clone(), cursor)?
            .ok_or_else(exhausted)
    }

    async fn resolve_related(&self, track: &Track) -> Result<Track> {
        let key = match &track.resolved_id {
            Some(id) => format!("{RELATED_PREFIX}{id}"),
            None => {
                return Err(VoiceDjError::TrackNotFound {
                    query: track.query.clone(),
                });
            }
        };
        self.lookup(&key, SearchCursor::new(&key))?
            .ok_or(VoiceDjError::TrackNotFound { query: key })
    }
}
