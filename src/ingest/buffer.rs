//! Per-speaker PCM accumulation with volume gating.
//!
//! All buffer state sits behind one mutex scoped to the speaker map. The
//! frame path and the silence scan only ever hold it for an append or a
//! snapshot-and-clear; recognition runs after the guard is dropped.

use crate::audio::frame::{AudioFormat, FrameConsumer, MonoAudio, PcmFrame, SpeakerId};
use crate::audio::frame::{downmix_to_mono, samples_to_ms};
use crate::audio::vad::NoiseGate;
use crate::clock::Clock;
use crate::defaults;
use crate::error::{Result, VoiceDjError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Decides whether a speaker's audio may be buffered right now.
pub trait SpeakerGate: Send + Sync {
    fn is_allowed(&self, speaker: SpeakerId) -> bool;
}

/// Gate that admits every speaker.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl SpeakerGate for AllowAll {
    fn is_allowed(&self, _speaker: SpeakerId) -> bool {
        true
    }
}

/// Tuning for buffering and segmentation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IngestConfig {
    /// Normalized RMS level a frame must exceed to count as speech.
    pub noise_floor: f32,
    /// Silence after the last loud frame that ends an utterance.
    pub silence_threshold: Duration,
    /// Snapshots shorter than this are discarded.
    pub min_utterance: Duration,
    /// Minimum time between two flushes of the same speaker.
    pub min_flush_interval: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            noise_floor: defaults::NOISE_FLOOR,
            silence_threshold: Duration::from_millis(defaults::SILENCE_THRESHOLD_MS),
            min_utterance: Duration::from_millis(defaults::MIN_UTTERANCE_MS),
            min_flush_interval: Duration::from_millis(defaults::MIN_FLUSH_INTERVAL_MS),
        }
    }
}

/// One segmented span of a single speaker's speech.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub speaker: SpeakerId,
    /// Interleaved samples as captured.
    pub samples: Vec<i16>,
    pub format: AudioFormat,
    pub captured_at: Instant,
    mixed_format: bool,
}

impl Utterance {
    pub fn new(
        speaker: SpeakerId,
        samples: Vec<i16>,
        format: AudioFormat,
        captured_at: Instant,
    ) -> Self {
        Self {
            speaker,
            samples,
            format,
            captured_at,
            mixed_format: false,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        samples_to_ms(self.samples.len(), self.format.sample_rate, self.format.channels)
    }

    /// Downmix to mono for recognition.
    ///
    /// Fails when frames of different formats were mixed into this utterance
    /// or the sample count does not divide into whole frames.
    pub fn to_mono(&self) -> Result<MonoAudio> {
        if self.mixed_format {
            return Err(VoiceDjError::AudioConversion {
                message: format!(
                    "utterance from speaker {} mixes frame formats",
                    self.speaker
                ),
            });
        }
        Ok(MonoAudio {
            samples: downmix_to_mono(&self.samples, self.format.channels)?,
            sample_rate: self.format.sample_rate,
        })
    }
}

/// What happened to a pushed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Loud frame appended.
    Voiced,
    /// Quiet frame appended inside the silence grace period.
    Trailing,
    /// Quiet frame dropped (no speech yet, or grace period exceeded).
    Dropped,
    /// Speaker is locked out; any buffered audio was cleared.
    Rejected,
}

/// Result of one silence scan.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Utterances ready for recognition. Their speakers are now pending.
    pub flushed: Vec<Utterance>,
    /// Snapshots discarded for being shorter than the minimum duration.
    pub discarded_short: usize,
    /// Buffers cleared because their speaker is locked out.
    pub cleared_locked: usize,
}

#[derive(Debug)]
struct SpeakerBuffer {
    samples: Vec<i16>,
    format: Option<AudioFormat>,
    mixed_format: bool,
    last_active: Instant,
    last_flush: Option<Instant>,
    pending: bool,
}

impl SpeakerBuffer {
    fn new(now: Instant) -> Self {
        Self {
            samples: Vec::new(),
            format: None,
            mixed_format: false,
            last_active: now,
            last_flush: None,
            pending: false,
        }
    }

    fn append(&mut self, frame: &PcmFrame) {
        match self.format {
            None => self.format = Some(frame.format()),
            Some(format) if format != frame.format() => self.mixed_format = true,
            Some(_) => {}
        }
        self.samples.extend_from_slice(&frame.samples);
    }

    fn clear(&mut self) {
        self.samples.clear();
        self.format = None;
        self.mixed_format = false;
    }
}

/// Per-speaker audio accumulator.
pub struct AudioIngestBuffer {
    buffers: Mutex<HashMap<SpeakerId, SpeakerBuffer>>,
    gate: NoiseGate,
    config: IngestConfig,
    speakers: Arc<dyn SpeakerGate>,
    clock: Arc<dyn Clock>,
}

impl AudioIngestBuffer {
    pub fn new(config: IngestConfig, speakers: Arc<dyn SpeakerGate>, clock: Arc<dyn Clock>) -> Self {
        Self {
            buffers: Mutex::new(HashMap::new()),
            gate: NoiseGate::new(config.noise_floor),
            config,
            speakers,
            clock,
        }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SpeakerId, SpeakerBuffer>> {
        self.buffers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Accept one frame from `speaker`.
    pub fn push_frame(&self, speaker: SpeakerId, frame: &PcmFrame) -> FrameOutcome {
        if !self.speakers.is_allowed(speaker) {
            if let Some(buffer) = self.lock().get_mut(&speaker) {
                buffer.clear();
            }
            return FrameOutcome::Rejected;
        }

        let level = self.gate.check(&frame.samples);
        let now = self.clock.now();
        let mut buffers = self.lock();
        let buffer = buffers
            .entry(speaker)
            .or_insert_with(|| SpeakerBuffer::new(now));

        if level.voiced {
            buffer.append(frame);
            buffer.last_active = now;
            return FrameOutcome::Voiced;
        }

        let silence = now.saturating_duration_since(buffer.last_active);
        if !buffer.samples.is_empty() && silence < self.config.silence_threshold {
            buffer.append(frame);
            FrameOutcome::Trailing
        } else {
            FrameOutcome::Dropped
        }
    }

    /// Flush every buffer whose speaker has been silent long enough.
    pub fn scan(&self) -> ScanReport {
        let now = self.clock.now();
        let mut report = ScanReport::default();
        let idle_after = self.config.silence_threshold + self.config.min_flush_interval;
        let mut buffers = self.lock();

        for (&speaker, buffer) in buffers.iter_mut() {
            if buffer.samples.is_empty() {
                continue;
            }
            if !self.speakers.is_allowed(speaker) {
                buffer.clear();
                report.cleared_locked += 1;
                continue;
            }

            let silence = now.saturating_duration_since(buffer.last_active);
            let spaced = buffer
                .last_flush
                .is_none_or(|at| now.saturating_duration_since(at) >= self.config.min_flush_interval);
            if silence < self.config.silence_threshold || buffer.pending || !spaced {
                continue;
            }

            let format = buffer.format.unwrap_or(AudioFormat {
                sample_rate: defaults::TRANSPORT_SAMPLE_RATE,
                channels: defaults::TRANSPORT_CHANNELS,
            });
            let utterance = Utterance {
                speaker,
                samples: std::mem::take(&mut buffer.samples),
                format,
                captured_at: now,
                mixed_format: buffer.mixed_format,
            };
            buffer.clear();
            buffer.last_flush = Some(now);

            if utterance.duration_ms() < self.config.min_utterance.as_millis() as u64 {
                tracing::trace!(
                    speaker,
                    duration_ms = utterance.duration_ms(),
                    "discarding short utterance"
                );
                report.discarded_short += 1;
                continue;
            }

            buffer.pending = true;
            report.flushed.push(utterance);
        }

        buffers.retain(|_, buffer| {
            buffer.pending
                || !buffer.samples.is_empty()
                || now.saturating_duration_since(buffer.last_active) < idle_after
        });

        report
    }

    /// Mark the speaker's in-flight utterance as finished.
    pub fn complete(&self, speaker: SpeakerId) {
        if let Some(buffer) = self.lock().get_mut(&speaker) {
            buffer.pending = false;
        }
    }

    pub fn is_pending(&self, speaker: SpeakerId) -> bool {
        self.lock().get(&speaker).is_some_and(|b| b.pending)
    }

    /// Milliseconds of audio currently buffered for `speaker`.
    pub fn buffered_ms(&self, speaker: SpeakerId) -> u64 {
        self.lock().get(&speaker).map_or(0, |b| match b.format {
            Some(format) => samples_to_ms(b.samples.len(), format.sample_rate, format.channels),
            None => 0,
        })
    }

    /// Number of speakers with live buffer state.
    pub fn tracked_speakers(&self) -> usize {
        self.lock().len()
    }

    /// Drop all buffered audio and pending marks.
    pub fn reset(&self) {
        self.lock().clear();
    }
}

impl FrameConsumer for AudioIngestBuffer {
    fn consume(&self, speaker: SpeakerId, frame: PcmFrame) {
        self.push_frame(speaker, &frame);
    }
}
