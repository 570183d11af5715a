//! Playlist import: expand a playlist link into search queries.

use crate::error::{Result, VoiceDjError};
use std::collections::HashMap;

const PLAYLIST_URI: &str = "spotify:playlist:";
const PLAYLIST_URL: &str = "https://open.spotify.com/playlist/";
const PLAYLIST_ID_LEN: usize = 22;

/// Extracts the playlist id from a Spotify playlist URI or URL.
///
/// ```
/// use voicedj::player::playlist::extract_playlist_id;
///
/// assert_eq!(
///     extract_playlist_id("https://open.spotify.com/playlist/2gaE8Y3U4aGTVrUCH1A5dQ?si=x"),
///     Some("2gaE8Y3U4aGTVrUCH1A5dQ")
/// );
/// assert_eq!(extract_playlist_id("never gonna give you up"), None);
/// ```
pub fn extract_playlist_id(input: &str) -> Option<&str> {
    let input = input.trim();
    let rest = input
        .strip_prefix(PLAYLIST_URI)
        .or_else(|| input.strip_prefix(PLAYLIST_URL))?;
    rest.get(..PLAYLIST_ID_LEN)
        .filter(|id| id.chars().all(|c| c.is_ascii_alphanumeric()))
}

/// Source of playlist contents.
#[async_trait::async_trait]
pub trait PlaylistProvider: Send + Sync {
    /// Tracks of the playlist as `"artists - title"` search queries, in order.
    async fn tracks(&self, playlist_id: &str) -> Result<Vec<String>>;
}

/// Playlists held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticPlaylistProvider {
    playlists: HashMap<String, Vec<String>>,
}

impl StaticPlaylistProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_playlist(mut self, id: &str, tracks: &[&str]) -> Self {
        self.playlists.insert(
            id.to_string(),
            tracks.iter().map(|t| t.to_string()).collect(),
        );
        self
    }
}

#[async_trait::async_trait]
impl PlaylistProvider for StaticPlaylistProvider {
    async fn tracks(&self, playlist_id: &str) -> Result<Vec<String>> {
        self.playlists
            .get(playlist_id)
            .cloned()
            .ok_or_else(|| VoiceDjError::TrackNotFound {
                query: format!("{PLAYLIST_URI}{playlist_id}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "2gaE8Y3U4aGTVrUCH1A5dQ";

    #[test]
    fn test_extract_from_uri() {
        assert_eq!(
            extract_playlist_id(&format!("spotify:playlist:{ID}")),
            Some(ID)
        );
    }

    #[test]
    fn test_extract_from_url_with_query() {
        let url = format!("https://open.spotify.com/playlist/{ID}?si=AaAa1aaAAA-AAaaAA12AAA");
        assert_eq!(extract_playlist_id(&url), Some(ID));
    }

    #[test]
    fn test_extract_rejects_short_or_foreign() {
        assert_eq!(extract_playlist_id("spotify:playlist:short"), None);
        assert_eq!(extract_playlist_id("spotify:track:2gaE8Y3U4aGTVrUCH1A5dQ"), None);
        assert_eq!(extract_playlist_id("play some music"), None);
    }

    #[tokio::test]
    async fn test_static_provider() {
        let provider =
            StaticPlaylistProvider::new().with_playlist(ID, &["Rick Astley - Never Gonna"]);
        assert_eq!(
            provider.tracks(ID).await.unwrap(),
            vec!["Rick Astley - Never Gonna".to_string()]
        );
        assert!(provider.tracks("missing").await.is_err());
    }
}
