//! External collaborators the media layer talks to.
//!
//! All network-facing providers are traits so a session can run against
//! mocks or any concrete backend.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

/// One search hit from the media provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaCandidate {
    pub title: String,
    pub uploader: String,
    pub duration_secs: Option<u64>,
    /// Page reference (watch URL or provider id), resolvable to a stream.
    pub page_ref: String,
    pub thumbnail: Option<String>,
    /// Short-form vertical clip.
    #[serde(default)]
    pub is_short: bool,
}

/// A playable stream plus the metadata reported when resolving it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedStream {
    pub stream_ref: String,
    pub title: String,
    pub uploader: String,
    pub duration_secs: Option<u64>,
    pub thumbnail: Option<String>,
    pub page_ref: String,
}

/// Title/artist summary from a metadata service or playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSummary {
    pub title: String,
    pub artist: String,
    /// Direct media identifier when the source already knows it.
    pub media_id: Option<String>,
    pub duration_secs: Option<u64>,
}

impl TrackSummary {
    pub fn new(title: &str, artist: &str) -> Self {
        Self {
            title: title.to_string(),
            artist: artist.to_string(),
            media_id: None,
            duration_secs: None,
        }
    }

    pub fn with_media_id(mut self, id: &str) -> Self {
        self.media_id = Some(id.to_string());
        self
    }

    /// "title artist", the query used to find this track by search.
    pub fn search_query(&self) -> String {
        format!("{} {}", self.title, self.artist).trim().to_string()
    }
}

#[async_trait]
pub trait MediaSearch: Send + Sync {
    /// Up to `limit` candidates for `query`.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<MediaCandidate>>;

    /// Resolve a page reference to a playable stream.
    async fn resolve_stream(&self, page_ref: &str) -> Result<ResolvedStream>;
}

#[async_trait]
pub trait MetadataSearch: Send + Sync {
    /// Ordered best-first track guesses for a free-text title query.
    async fn search_tracks(&self, query: &str) -> Result<Vec<TrackSummary>>;
}

#[async_trait]
pub trait PlaylistExpander: Send + Sync {
    async fn expand(&self, playlist_ref: &str) -> Result<Vec<TrackSummary>>;
}

/// Signal posted back to the jukebox when a track stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackFinished {
    pub generation: u64,
}

/// One-shot completion handle passed to [`PlaybackSink::play`].
///
/// Consuming it posts exactly one [`TrackFinished`]. Dropping it unused posts
/// nothing, so a sink that fails to start never triggers a continuation.
#[derive(Debug)]
pub struct PlaybackCompletion {
    tx: mpsc::UnboundedSender<TrackFinished>,
    generation: u64,
}

impl PlaybackCompletion {
    pub fn new(tx: mpsc::UnboundedSender<TrackFinished>, generation: u64) -> Self {
        Self { tx, generation }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Report that playback ended, naturally or by stop.
    pub fn complete(self) {
        // Receiver gone means the session is shutting down.
        let _ = self.tx.send(TrackFinished {
            generation: self.generation,
        });
    }
}

/// Audio output of the voice session.
pub trait PlaybackSink: Send + Sync {
    /// Start playing `stream_ref`. Must not block; `completion` is consumed
    /// once playback ends.
    fn play(&self, stream_ref: &str, completion: PlaybackCompletion) -> Result<()>;

    fn stop(&self);

    fn pause(&self);

    fn resume(&self);
}

impl<T: PlaybackSink + ?Sized> PlaybackSink for Arc<T> {
    fn play(&self, stream_ref: &str, completion: PlaybackCompletion) -> Result<()> {
        (**self).play(stream_ref, completion)
    }

    fn stop(&self) {
        (**self).stop()
    }

    fn pause(&self) {
        (**self).pause()
    }

    fn resume(&self) {
        (**self).resume()
    }
}
