//! Track search, ranking, the playback queue and its driver.

pub mod jukebox;
pub mod provider;
pub mod queue;
pub mod ranking;
pub mod resolver;

pub use jukebox::Jukebox;
pub use provider::{
    MediaCandidate, MediaSearch, MetadataSearch, PlaybackCompletion, PlaybackSink,
    PlaylistExpander, ResolvedStream, TrackFinished, TrackSummary,
};
pub use queue::{DeferredLocator, PlaybackQueue, QueueEntry};
pub use ranking::CandidateRanker;
pub use resolver::{ResolverConfig, TrackResolver};
