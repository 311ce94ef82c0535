//! Audio primitives: frame decoding, level gating, WAV replay.

pub mod frame;
pub mod vad;
pub mod wav;

pub use frame::{
    AudioFormat, FrameConsumer, MonoAudio, PcmFrame, SpeakerId, decode_pcm_bytes,
    downmix_to_mono,
};
pub use vad::{GateResult, NoiseGate, calculate_rms};
