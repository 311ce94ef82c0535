//! In-memory providers for driving a session without network backends.
//!
//! Every mock records what it was asked. Recordings are shared across clones
//! so a test can hand one clone to the session and inspect another.

use crate::error::{Result, VoiceDjError};
use crate::media::provider::{
    MediaCandidate, MediaSearch, MetadataSearch, PlaybackCompletion, PlaybackSink,
    PlaylistExpander, ResolvedStream, TrackSummary,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

pub use crate::pipeline::error::CollectingReporter;
pub use crate::pipeline::events::CollectorEventSink;
pub use crate::stt::recognizer::MockRecognizer;

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Search candidate with a page reference of `page:<title>`.
pub fn candidate(title: &str, uploader: &str, duration_secs: Option<u64>) -> MediaCandidate {
    MediaCandidate {
        title: title.to_string(),
        uploader: uploader.to_string(),
        duration_secs,
        page_ref: format!("page:{title}"),
        thumbnail: None,
        is_short: false,
    }
}

/// Media search answering from a fixed query table.
///
/// Unknown queries return no candidates. Streams resolve to
/// `stream:<page_ref>` and carry the title of the matching candidate.
#[derive(Debug, Clone, Default)]
pub struct MockMediaSearch {
    results: HashMap<String, Vec<MediaCandidate>>,
    search_failures: HashSet<String>,
    resolve_failures: HashSet<String>,
    search_delay: Option<Duration>,
    search_panics: Arc<AtomicUsize>,
    queries: Arc<Mutex<Vec<String>>>,
    resolved: Arc<Mutex<Vec<String>>>,
}

impl MockMediaSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(mut self, query: &str, candidates: Vec<MediaCandidate>) -> Self {
        self.results.insert(query.to_string(), candidates);
        self
    }

    pub fn with_search_failure(mut self, query: &str) -> Self {
        self.search_failures.insert(query.to_string());
        self
    }

    /// Fail `resolve_stream` for this page reference or media id.
    pub fn with_resolve_failure(mut self, page_ref: &str) -> Self {
        self.resolve_failures.insert(page_ref.to_string());
        self
    }

    /// Panic inside the next `count` searches.
    pub fn with_search_panics(self, count: usize) -> Self {
        self.search_panics.store(count, Ordering::SeqCst);
        self
    }

    /// Sleep before answering every search.
    pub fn with_search_delay(mut self, delay: Duration) -> Self {
        self.search_delay = Some(delay);
        self
    }

    /// Queries searched so far, in order.
    pub fn queries(&self) -> Vec<String> {
        locked(&self.queries).clone()
    }

    /// Page references resolved so far, in order, failures included.
    pub fn resolved(&self) -> Vec<String> {
        locked(&self.resolved).clone()
    }

    fn known_candidate(&self, page_ref: &str) -> Option<&MediaCandidate> {
        self.results
            .values()
            .flatten()
            .find(|c| c.page_ref == page_ref)
    }
}

#[async_trait]
impl MediaSearch for MockMediaSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<MediaCandidate>> {
        locked(&self.queries).push(query.to_string());
        let armed = self
            .search_panics
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if armed {
            panic!("mock search crashed on '{query}'");
        }
        if let Some(delay) = self.search_delay {
            tokio::time::sleep(delay).await;
        }
        if self.search_failures.contains(query) {
            return Err(VoiceDjError::Search {
                query: query.to_string(),
                message: "mock search failure".to_string(),
            });
        }
        let mut found = self.results.get(query).cloned().unwrap_or_default();
        found.truncate(limit);
        Ok(found)
    }

    async fn resolve_stream(&self, page_ref: &str) -> Result<ResolvedStream> {
        locked(&self.resolved).push(page_ref.to_string());
        if self.resolve_failures.contains(page_ref) {
            return Err(VoiceDjError::Resolution {
                locator: page_ref.to_string(),
                message: "mock resolution failure".to_string(),
            });
        }
        let known = self.known_candidate(page_ref);
        Ok(ResolvedStream {
            stream_ref: format!("stream:{page_ref}"),
            title: known.map_or_else(String::new, |c| c.title.clone()),
            uploader: known.map_or_else(String::new, |c| c.uploader.clone()),
            duration_secs: known.and_then(|c| c.duration_secs),
            thumbnail: None,
            page_ref: page_ref.to_string(),
        })
    }
}

/// Metadata service answering from a fixed query table.
#[derive(Debug, Clone, Default)]
pub struct MockMetadataSearch {
    tracks: HashMap<String, Vec<TrackSummary>>,
    fail: bool,
}

impl MockMetadataSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tracks(mut self, query: &str, tracks: Vec<TrackSummary>) -> Self {
        self.tracks.insert(query.to_string(), tracks);
        self
    }

    pub fn with_failure(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl MetadataSearch for MockMetadataSearch {
    async fn search_tracks(&self, query: &str) -> Result<Vec<TrackSummary>> {
        if self.fail {
            return Err(VoiceDjError::Search {
                query: query.to_string(),
                message: "mock metadata failure".to_string(),
            });
        }
        Ok(self.tracks.get(query).cloned().unwrap_or_default())
    }
}

/// Playlist expander answering from a fixed table.
#[derive(Debug, Clone, Default)]
pub struct MockPlaylistExpander {
    playlists: HashMap<String, Vec<TrackSummary>>,
}

impl MockPlaylistExpander {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_playlist(mut self, playlist_ref: &str, tracks: Vec<TrackSummary>) -> Self {
        self.playlists.insert(playlist_ref.to_string(), tracks);
        self
    }
}

#[async_trait]
impl PlaylistExpander for MockPlaylistExpander {
    async fn expand(&self, playlist_ref: &str) -> Result<Vec<TrackSummary>> {
        self.playlists
            .get(playlist_ref)
            .cloned()
            .ok_or_else(|| VoiceDjError::PlaylistExpansion {
                playlist: playlist_ref.to_string(),
                message: "unknown playlist".to_string(),
            })
    }
}

#[derive(Debug, Default)]
struct SinkState {
    played: Vec<String>,
    pending: Option<PlaybackCompletion>,
    paused: bool,
    stops: usize,
}

/// Playback sink that never produces audio.
///
/// A started track stays "playing" until [`MockPlaybackSink::finish_current`]
/// or `stop` consumes its completion.
#[derive(Debug, Clone, Default)]
pub struct MockPlaybackSink {
    state: Arc<Mutex<SinkState>>,
    failing: Arc<HashSet<String>>,
    panicking: Arc<Mutex<HashSet<String>>>,
}

impl MockPlaybackSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse to start this stream.
    pub fn with_play_failure(mut self, stream_ref: &str) -> Self {
        Arc::make_mut(&mut self.failing).insert(stream_ref.to_string());
        self
    }

    /// Panic the first time this stream is started.
    pub fn with_play_panic(self, stream_ref: &str) -> Self {
        locked(&self.panicking).insert(stream_ref.to_string());
        self
    }

    /// Streams started so far, in order.
    pub fn played(&self) -> Vec<String> {
        locked(&self.state).played.clone()
    }

    pub fn is_playing(&self) -> bool {
        locked(&self.state).pending.is_some()
    }

    pub fn is_paused(&self) -> bool {
        locked(&self.state).paused
    }

    pub fn stops(&self) -> usize {
        locked(&self.state).stops
    }

    /// End the current track naturally. Returns false if nothing was playing.
    pub fn finish_current(&self) -> bool {
        let pending = locked(&self.state).pending.take();
        match pending {
            Some(completion) => {
                completion.complete();
                true
            }
            None => false,
        }
    }
}

impl PlaybackSink for MockPlaybackSink {
    fn play(&self, stream_ref: &str, completion: PlaybackCompletion) -> Result<()> {
        if locked(&self.panicking).remove(stream_ref) {
            panic!("mock sink crashed on {stream_ref}");
        }
        if self.failing.contains(stream_ref) {
            return Err(VoiceDjError::Playback {
                message: format!("mock sink refused {stream_ref}"),
            });
        }
        let mut state = locked(&self.state);
        state.played.push(stream_ref.to_string());
        state.paused = false;
        state.pending = Some(completion);
        Ok(())
    }

    fn stop(&self) {
        let pending = {
            let mut state = locked(&self.state);
            state.stops += 1;
            state.paused = false;
            state.pending.take()
        };
        if let Some(completion) = pending {
            completion.complete();
        }
    }

    fn pause(&self) {
        locked(&self.state).paused = true;
    }

    fn resume(&self) {
        locked(&self.state).paused = false;
    }
}
