//! PCM frame types and the decode contract of the audio frame source.
//!
//! The voice transport hands over raw little-endian 16-bit PCM, tagged with
//! the speaking user. Anything it cannot decode is replaced by a silence frame
//! of one transport interval, so a corrupted packet never reaches the buffers
//! as garbage and never aborts the frame path.

use crate::defaults;
use crate::error::{Result, VoiceDjError};

/// Identity of a speaker in the voice session (the platform user id).
pub type SpeakerId = u64;

/// One interleaved PCM frame as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmFrame {
    /// Interleaved 16-bit samples.
    pub samples: Vec<i16>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
}

impl PcmFrame {
    pub fn new(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// A frame of digital silence covering `frame_ms` at the given format.
    pub fn silence(sample_rate: u32, channels: u16, frame_ms: u32) -> Self {
        let per_channel = (sample_rate as u64 * frame_ms as u64 / 1000) as usize;
        Self::new(
            vec![0; per_channel * channels.max(1) as usize],
            sample_rate,
            channels.max(1),
        )
    }

    /// Duration of this frame in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        samples_to_ms(self.samples.len(), self.sample_rate, self.channels)
    }

    pub fn format(&self) -> AudioFormat {
        AudioFormat {
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }
}

/// Sample rate and channel layout of a PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}Hz/{}ch", self.sample_rate, self.channels)
    }
}

/// Mono audio ready for a recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonoAudio {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl MonoAudio {
    pub fn duration_ms(&self) -> u64 {
        samples_to_ms(self.samples.len(), self.sample_rate, 1)
    }
}

/// Capability of anything that accepts speaker-tagged PCM frames.
///
/// The transport layer only ever sees this trait.
pub trait FrameConsumer: Send + Sync {
    fn consume(&self, speaker: SpeakerId, frame: PcmFrame);
}

/// Decode raw little-endian 16-bit PCM bytes into a frame.
///
/// Malformed input (zero channels, odd byte count, or a sample count that is
/// not a multiple of the channel count) yields one transport interval of
/// silence at the stated format instead of an error.
pub fn decode_pcm_bytes(bytes: &[u8], sample_rate: u32, channels: u16) -> PcmFrame {
    let frame_bytes = 2 * channels as usize;
    if channels == 0 || sample_rate == 0 || bytes.len() % frame_bytes.max(2) != 0 {
        tracing::trace!(
            len = bytes.len(),
            channels,
            "malformed PCM frame, substituting silence"
        );
        return PcmFrame::silence(
            if sample_rate == 0 {
                defaults::TRANSPORT_SAMPLE_RATE
            } else {
                sample_rate
            },
            channels.max(1),
            defaults::FRAME_MS,
        );
    }

    let samples = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    PcmFrame::new(samples, sample_rate, channels)
}

/// Average interleaved channels down to mono.
pub fn downmix_to_mono(samples: &[i16], channels: u16) -> Result<Vec<i16>> {
    match channels {
        0 => Err(VoiceDjError::AudioConversion {
            message: "zero channels".to_string(),
        }),
        1 => Ok(samples.to_vec()),
        n => {
            let n = n as usize;
            if samples.len() % n != 0 {
                return Err(VoiceDjError::AudioConversion {
                    message: format!(
                        "{} samples is not a multiple of {} channels",
                        samples.len(),
                        n
                    ),
                });
            }
            Ok(samples
                .chunks_exact(n)
                .map(|chunk| {
                    let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
                    (sum / n as i32) as i16
                })
                .collect())
        }
    }
}

/// Duration covered by `len` interleaved samples.
pub fn samples_to_ms(len: usize, sample_rate: u32, channels: u16) -> u64 {
    if sample_rate == 0 || channels == 0 {
        return 0;
    }
    (len as u64 * 1000) / (sample_rate as u64 * channels as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_valid_stereo_bytes() {
        let bytes = [0x01, 0x00, 0xFF, 0xFF, 0x10, 0x00, 0x20, 0x00];
        let frame = decode_pcm_bytes(&bytes, 48_000, 2);
        assert_eq!(frame.samples, vec![1, -1, 16, 32]);
        assert_eq!(frame.channels, 2);
    }

    #[test]
    fn decode_malformed_bytes_yields_twenty_ms_silence() {
        let frame = decode_pcm_bytes(&[1, 2, 3], 48_000, 2);
        // 960 samples per channel * 2 channels = 3840 bytes of silence
        assert_eq!(frame.samples.len(), 1920);
        assert!(frame.samples.iter().all(|&s| s == 0));
        assert_eq!(frame.duration_ms(), 20);
    }

    #[test]
    fn decode_zero_channels_yields_mono_silence() {
        let frame = decode_pcm_bytes(&[0, 0, 0, 0], 48_000, 0);
        assert_eq!(frame.channels, 1);
        assert_eq!(frame.samples.len(), 960);
    }

    #[test]
    fn downmix_stereo_averages_pairs() {
        let mono = downmix_to_mono(&[100, 300, -200, 200, i16::MAX, i16::MAX], 2).unwrap();
        assert_eq!(mono, vec![200, 0, i16::MAX]);
    }

    #[test]
    fn downmix_rejects_ragged_input() {
        assert!(downmix_to_mono(&[1, 2, 3], 2).is_err());
        assert!(downmix_to_mono(&[1, 2], 0).is_err());
    }

    #[test]
    fn downmix_mono_is_identity() {
        assert_eq!(downmix_to_mono(&[5, 6, 7], 1).unwrap(), vec![5, 6, 7]);
    }

    #[test]
    fn frame_duration_accounts_for_channels() {
        let frame = PcmFrame::new(vec![0; 1920], 48_000, 2);
        assert_eq!(frame.duration_ms(), 20);
        assert_eq!(frame.format().to_string(), "48000Hz/2ch");
    }
}
