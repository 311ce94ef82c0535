//! Queue entries and the FIFO playback queue.

use crate::media::provider::{ResolvedStream, TrackSummary};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Where a lazy entry will be resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredLocator {
    /// Direct media identifier, resolvable without search.
    MediaId(String),
    /// Free-text search query.
    Search(String),
}

/// A track in the queue, resolved or lazy.
///
/// A lazy entry carries display metadata and a deferred locator but no
/// stream. It is resolved in place exactly once, right before playback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub resolved: bool,
    pub title: String,
    pub uploader: String,
    pub duration_secs: Option<u64>,
    pub thumbnail: Option<String>,
    /// Page reference, or the media id for lazy entries that have one.
    pub page_ref: String,
    pub stream_ref: Option<String>,
    pub search_query: Option<String>,
}

impl QueueEntry {
    /// Entry for an already-resolved stream.
    pub fn from_stream(stream: ResolvedStream) -> Self {
        Self {
            resolved: true,
            title: stream.title,
            uploader: stream.uploader,
            duration_secs: stream.duration_secs,
            thumbnail: stream.thumbnail,
            page_ref: stream.page_ref,
            stream_ref: Some(stream.stream_ref),
            search_query: None,
        }
    }

    /// Lazy entry from a playlist track.
    pub fn lazy(track: &TrackSummary) -> Self {
        let (page_ref, search_query) = match &track.media_id {
            Some(id) => (id.clone(), None),
            None => (String::new(), Some(track.search_query())),
        };
        Self {
            resolved: false,
            title: track.title.clone(),
            uploader: track.artist.clone(),
            duration_secs: track.duration_secs,
            thumbnail: None,
            page_ref,
            stream_ref: None,
            search_query,
        }
    }

    /// How to resolve this entry, or `None` if it is already resolved.
    pub fn locator(&self) -> Option<DeferredLocator> {
        if self.resolved {
            return None;
        }
        match &self.search_query {
            Some(query) => Some(DeferredLocator::Search(query.clone())),
            None => Some(DeferredLocator::MediaId(self.page_ref.clone())),
        }
    }

    /// Fill in stream details. Display fields keep their playlist values when
    /// the provider reports nothing better.
    pub fn mark_resolved(&mut self, stream: ResolvedStream) {
        if !stream.title.is_empty() {
            self.title = stream.title;
        }
        if !stream.uploader.is_empty() {
            self.uploader = stream.uploader;
        }
        self.duration_secs = stream.duration_secs.or(self.duration_secs);
        self.thumbnail = stream.thumbnail.or(self.thumbnail.take());
        self.page_ref = stream.page_ref;
        self.stream_ref = Some(stream.stream_ref);
        self.resolved = true;
    }
}

/// Strict FIFO queue with a separate now-playing slot.
#[derive(Debug, Clone, Default)]
pub struct PlaybackQueue {
    entries: VecDeque<QueueEntry>,
    current: Option<QueueEntry>,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append and return the 1-based position.
    pub fn push(&mut self, entry: QueueEntry) -> usize {
        self.entries.push_back(entry);
        self.entries.len()
    }

    pub fn pop_front(&mut self) -> Option<QueueEntry> {
        self.entries.pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Titles waiting to play. Never includes the current entry.
    pub fn titles(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.title.clone()).collect()
    }

    pub fn current(&self) -> Option<&QueueEntry> {
        self.current.as_ref()
    }

    pub fn set_current(&mut self, entry: QueueEntry) {
        self.current = Some(entry);
    }

    pub fn take_current(&mut self) -> Option<QueueEntry> {
        self.current.take()
    }

    /// Drop every waiting entry and the current slot; returns how many were waiting.
    pub fn clear(&mut self) -> usize {
        let waiting = self.entries.len();
        self.entries.clear();
        self.current = None;
        waiting
    }
}
