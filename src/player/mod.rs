//! Music playback: queue, pause/resume through the sink, autoplay.

pub mod actor;
pub mod controller;
pub mod playlist;
pub mod resolver;
pub mod sink;
pub mod track;

pub use actor::{PlayerHandle, PlayerSnapshot};
pub use controller::{PlaybackController, PlaybackEvent, PlaybackStatus};
pub use playlist::{PlaylistProvider, StaticPlaylistProvider, extract_playlist_id};
pub use resolver::{MockResolver, TrackResolver};
pub use sink::{AudioSink, MockSink, SinkCall, SinkEvent};
pub use track::{AudioHandle, AudioStream, SearchCursor, Track, TrackInfo};
