//! Query-to-stream resolution.
//!
//! A spoken request becomes an ordered list of search variations (metadata
//! guess, corrector variations, "official" augmentations). Each variation is
//! searched, filtered and ranked; the first one with a positively scored
//! candidate wins.

use crate::correction::QueryCorrector;
use crate::defaults;
use crate::error::{Result, VoiceDjError};
use crate::media::provider::{MediaCandidate, MediaSearch, MetadataSearch, ResolvedStream};
use crate::media::queue::DeferredLocator;
use crate::media::ranking::{CandidateRanker, augment_variations};
use crate::pipeline::events::{EventSink, SessionEvent};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub candidate_limit: usize,
    pub min_track_secs: u64,
    pub max_track_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            candidate_limit: defaults::SEARCH_CANDIDATE_LIMIT,
            min_track_secs: defaults::MIN_TRACK_SECS,
            max_track_secs: defaults::MAX_TRACK_SECS,
        }
    }
}

pub struct TrackResolver {
    search: Arc<dyn MediaSearch>,
    metadata: Option<Arc<dyn MetadataSearch>>,
    corrector: Arc<QueryCorrector>,
    ranker: CandidateRanker,
    candidate_limit: usize,
    events: Arc<dyn EventSink>,
}

impl TrackResolver {
    pub fn new(
        search: Arc<dyn MediaSearch>,
        corrector: Arc<QueryCorrector>,
        config: ResolverConfig,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            search,
            metadata: None,
            corrector,
            ranker: CandidateRanker::new(config.min_track_secs, config.max_track_secs),
            candidate_limit: config.candidate_limit,
            events,
        }
    }

    /// Use a metadata service for exact title guesses.
    pub fn with_metadata(mut self, metadata: Arc<dyn MetadataSearch>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    async fn metadata_guess(&self, raw_query: &str) -> Option<String> {
        let metadata = self.metadata.as_ref()?;
        match metadata.search_tracks(raw_query).await {
            Ok(tracks) => tracks
                .first()
                .map(|t| t.search_query())
                .filter(|q| !q.is_empty()),
            Err(e) => {
                tracing::debug!(query = raw_query, error = %e, "metadata lookup failed");
                None
            }
        }
    }

    /// Variations in the order they will be searched.
    pub async fn variations(&self, raw_query: &str) -> Vec<String> {
        let mut base = self.corrector.variations(raw_query);
        if let Some(guess) = self.metadata_guess(raw_query).await {
            self.events.emit(SessionEvent::MetadataGuess {
                title: guess.clone(),
            });
            base.retain(|v| v != &guess);
            base.insert(0, guess);
        }
        augment_variations(&base)
    }

    async fn best_for(&self, query: &str, raw_query: &str) -> Result<Option<MediaCandidate>> {
        let candidates = self.search.search(query, self.candidate_limit).await?;
        Ok(self
            .ranker
            .best(&candidates, query, raw_query)
            .map(|(candidate, score)| {
                tracing::debug!(query, title = %candidate.title, score, "best candidate");
                candidate.clone()
            }))
    }

    async fn stream_for(&self, candidate: &MediaCandidate) -> Result<ResolvedStream> {
        let mut stream = self.search.resolve_stream(&candidate.page_ref).await?;
        if stream.title.is_empty() {
            stream.title = candidate.title.clone();
        }
        if stream.uploader.is_empty() {
            stream.uploader = candidate.uploader.clone();
        }
        stream.duration_secs = stream.duration_secs.or(candidate.duration_secs);
        stream.thumbnail = stream.thumbnail.or_else(|| candidate.thumbnail.clone());
        Ok(stream)
    }

    /// Resolve a spoken request, trying each variation in turn.
    pub async fn resolve_query(&self, raw_query: &str) -> Result<ResolvedStream> {
        for variation in self.variations(raw_query).await {
            let candidate = match self.best_for(&variation, raw_query).await {
                Ok(Some(candidate)) => candidate,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(query = %variation, error = %e, "search failed");
                    continue;
                }
            };
            match self.stream_for(&candidate).await {
                Ok(stream) => {
                    tracing::info!(query = raw_query, title = %stream.title, "resolved");
                    return Ok(stream);
                }
                Err(e) => tracing::warn!(page = %candidate.page_ref, error = %e, "stream resolution failed"),
            }
        }
        Err(VoiceDjError::NoUsableCandidate {
            query: raw_query.to_string(),
        })
    }

    /// Resolve a lazy queue entry right before playback.
    pub async fn resolve_deferred(&self, locator: &DeferredLocator) -> Result<ResolvedStream> {
        match locator {
            DeferredLocator::MediaId(id) => self.search.resolve_stream(id).await,
            DeferredLocator::Search(query) => {
                let candidate = self.best_for(query, query).await?.ok_or_else(|| {
                    VoiceDjError::Resolution {
                        locator: query.clone(),
                        message: "no usable candidate".to_string(),
                    }
                })?;
                self.stream_for(&candidate).await
            }
        }
    }
}
