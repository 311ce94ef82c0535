//! Amplitude gating for incoming frames.
//!
//! Per-frame RMS against a fixed noise floor. Segmentation itself is
//! time-based and lives in the ingest buffer; this module only answers
//! "is this frame loud enough to count as speech".

use crate::defaults;

/// Result of gating one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateResult {
    /// Normalized RMS level (0.0 to 1.0).
    pub level: f32,
    /// Whether the level exceeded the noise floor.
    pub voiced: bool,
}

/// Fixed-threshold RMS noise gate.
#[derive(Debug, Clone, Copy)]
pub struct NoiseGate {
    noise_floor: f32,
}

impl NoiseGate {
    pub fn new(noise_floor: f32) -> Self {
        Self { noise_floor }
    }

    pub fn noise_floor(&self) -> f32 {
        self.noise_floor
    }

    /// Measures a frame of interleaved samples.
    pub fn check(&self, samples: &[i16]) -> GateResult {
        let level = calculate_rms(samples);
        GateResult {
            level,
            voiced: level > self.noise_floor,
        }
    }
}

impl Default for NoiseGate {
    fn default() -> Self {
        Self::new(defaults::NOISE_FLOOR)
    }
}

/// Calculates the Root Mean Square (RMS) of audio samples.
///
/// # Returns
/// Normalized RMS value (0.0 to 1.0), where:
/// - 0.0 represents silence
/// - ~0.707 represents a full-scale sine wave
/// - 1.0 represents maximum amplitude
pub fn calculate_rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples
        .iter()
        .map(|&sample| {
            let normalized = sample as f64 / i16::MAX as f64;
            normalized * normalized
        })
        .sum();

    let mean_square = sum_squares / samples.len() as f64;
    mean_square.sqrt() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms_silence_is_zero() {
        assert_eq!(calculate_rms(&[0i16; 960]), 0.0);
    }

    #[test]
    fn test_rms_empty_samples() {
        assert_eq!(calculate_rms(&[]), 0.0);
    }

    #[test]
    fn test_rms_max_amplitude() {
        let rms = calculate_rms(&[i16::MAX; 1000]);
        assert!((rms - 1.0).abs() < 0.001, "RMS should be ~1.0, got {}", rms);
    }

    #[test]
    fn test_rms_mixed_positive_negative() {
        let mut mixed = vec![1000i16; 500];
        mixed.extend(vec![-1000i16; 500]);
        let rms = calculate_rms(&mixed);
        assert!(rms > 0.025 && rms < 0.035, "RMS should be ~0.0305, got {}", rms);
    }

    #[test]
    fn gate_passes_speech_level() {
        let gate = NoiseGate::default();
        let result = gate.check(&[3000i16; 960]);
        assert!(result.voiced);
        assert!(result.level > gate.noise_floor());
    }

    #[test]
    fn gate_blocks_background_hiss() {
        // ~20 on the raw scale, below the default floor of ~50
        let gate = NoiseGate::default();
        assert!(!gate.check(&[20i16; 960]).voiced);
    }

    #[test]
    fn gate_threshold_is_exclusive() {
        let gate = NoiseGate::new(1.0);
        assert!(!gate.check(&[i16::MAX; 10]).voiced);
    }
}
