//! Speech recognition and dual-language arbitration.

pub mod arbiter;
pub mod recognizer;

pub use arbiter::{
    ArbiterConfig, RecognizedPhrase, TranscriptCandidate, TranscriptionArbiter, select_transcript,
};
pub use recognizer::{MockRecognizer, SpeechRecognizer};
