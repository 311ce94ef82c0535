//! Per-speaker buffering and silence segmentation.

pub mod buffer;
pub mod segmenter;

pub use buffer::{
    AllowAll, AudioIngestBuffer, FrameOutcome, IngestConfig, ScanReport, SpeakerGate, Utterance,
};
pub use segmenter::{SilenceSegmenter, UtteranceHandler};
