//! voicedj - Voice-driven music requests for group voice sessions
//!
//! Turns multi-speaker voice audio into playback commands: per-speaker
//! silence segmentation, dual-language recognition, a wake-phrase command
//! window guarded by a speaker lock, request filtering and correction, and
//! ranked, lazily resolved track search feeding a FIFO queue.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod clock;
pub mod config;
pub mod correction;
pub mod defaults;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod media;
pub mod pipeline;
pub mod session;
pub mod stt;
pub mod testing;

// Core traits (frames in, providers out)
pub use audio::frame::FrameConsumer;
pub use clock::{Clock, ManualClock, SystemClock};
pub use media::provider::{MediaSearch, MetadataSearch, PlaybackSink, PlaylistExpander};
pub use stt::recognizer::SpeechRecognizer;

// Session
pub use pipeline::events::{EventSink, SessionEvent};
pub use pipeline::session::{Providers, VoiceSession, VoiceSessionHandle};

// Error handling
pub use error::{Result, VoiceDjError};

// Config
pub use config::Config;

// Standalone text tools
pub use correction::QueryCorrector;
pub use filter::ContentFilter;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }

    #[test]
    fn version_string_has_hash_suffix_only_with_git() {
        let ver = version_string();
        if option_env!("GIT_HASH").is_some_and(|h| !h.is_empty()) {
            assert!(ver.contains('+'), "expected '+<hash>', got: {}", ver);
        } else {
            assert_eq!(ver, env!("CARGO_PKG_VERSION"));
        }
    }
}
