//! Command-line interface for voicedj
//!
//! Argument parsing with clap derive macros, plus the offline helpers the
//! subcommands run: request checks and WAV segmentation replay.

use crate::audio::frame::SpeakerId;
use crate::audio::wav::read_frames;
use crate::clock::ManualClock;
use crate::defaults;
use crate::error::Result;
use crate::ingest::{AllowAll, AudioIngestBuffer, IngestConfig};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Voice-driven music requests for group voice sessions
#[derive(Parser, Debug)]
#[command(
    name = "voicedj",
    version,
    about = "Voice-driven music requests for group voice sessions"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse a duration flag.
///
/// Bare numbers are milliseconds; anything else goes through `humantime`
/// (`200ms`, `2s`, `1s500ms`).
fn parse_duration_arg(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if let Ok(ms) = s.parse::<u64>() {
        return Ok(Duration::from_millis(ms));
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a song request against the content filter
    Filter {
        /// Request text, as it would be heard after the wake phrase
        query: String,
    },

    /// Show how a request is corrected before searching
    Correct {
        /// Request text
        query: String,
    },

    /// Replay a WAV file through the silence segmenter
    Segment {
        /// 16-bit PCM WAV file
        wav: PathBuf,

        /// Speaker id to tag the frames with
        #[arg(long, value_name = "ID", default_value = "1")]
        speaker: SpeakerId,

        /// Frame length fed to the buffer (e.g. 20ms)
        #[arg(long, value_name = "DURATION", default_value = "20ms", value_parser = parse_duration_arg)]
        frame: Duration,

        /// Silence scan period (default: from config)
        #[arg(long, value_name = "DURATION", value_parser = parse_duration_arg)]
        scan_interval: Option<Duration>,

        /// Silence that ends an utterance (default: from config)
        #[arg(long, value_name = "DURATION", value_parser = parse_duration_arg)]
        silence: Option<Duration>,
    },

    /// View and create configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration (file, defaults and env overrides)
    Show,
    /// Print the configuration file path
    Path,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// One utterance cut from an offline replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentSummary {
    pub speaker: SpeakerId,
    /// Replay time at which the utterance was flushed.
    pub flushed_at_ms: u64,
    pub duration_ms: u64,
}

/// Outcome of replaying a whole file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub segments: Vec<SegmentSummary>,
    pub discarded_short: usize,
    pub frames: usize,
}

/// Replay a WAV file through an [`AudioIngestBuffer`] on a manual clock.
///
/// Frames are pushed back to back and the clock advances by each frame's
/// duration, so the replay runs as fast as the file can be read. Trailing
/// silence is simulated after the last frame so the final utterance flushes.
pub fn replay_wav(
    path: &Path,
    speaker: SpeakerId,
    frame: Duration,
    scan_interval: Duration,
    config: IngestConfig,
) -> Result<ReplayReport> {
    let frame_ms = (frame.as_millis() as u32).max(1);
    let frames = read_frames(path, frame_ms)?;
    let clock = Arc::new(ManualClock::new());
    let buffer = AudioIngestBuffer::new(config, Arc::new(AllowAll), clock.clone());
    let scan_ms = (scan_interval.as_millis() as u64).max(1);

    let mut report = ReplayReport {
        frames: frames.len(),
        ..ReplayReport::default()
    };
    let mut elapsed_ms = 0u64;
    let mut next_scan_ms = scan_ms;

    for pcm in &frames {
        buffer.push_frame(speaker, pcm);
        let step = pcm.duration_ms().max(1);
        clock.advance_ms(step);
        elapsed_ms += step;
        while elapsed_ms >= next_scan_ms {
            scan_once(&buffer, elapsed_ms, &mut report);
            next_scan_ms += scan_ms;
        }
    }

    let drain_ms = config.silence_threshold.as_millis() as u64
        + config.min_flush_interval.as_millis() as u64;
    let drain_until = elapsed_ms + drain_ms;
    while elapsed_ms < drain_until {
        clock.advance_ms(scan_ms);
        elapsed_ms += scan_ms;
        scan_once(&buffer, elapsed_ms, &mut report);
    }

    tracing::debug!(
        frames = report.frames,
        segments = report.segments.len(),
        discarded = report.discarded_short,
        "replay finished"
    );
    Ok(report)
}

fn scan_once(buffer: &AudioIngestBuffer, at_ms: u64, report: &mut ReplayReport) {
    let scanned = buffer.scan();
    report.discarded_short += scanned.discarded_short;
    for utterance in scanned.flushed {
        buffer.complete(utterance.speaker);
        report.segments.push(SegmentSummary {
            speaker: utterance.speaker,
            flushed_at_ms: at_ms,
            duration_ms: utterance.duration_ms(),
        });
    }
}

/// Scan period used when neither the flag nor the config sets one.
pub fn default_scan_interval() -> Duration {
    Duration::from_millis(defaults::SCAN_INTERVAL_MS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_wav(dir: &TempDir, name: &str, samples: &[i16]) -> PathBuf {
        let path = dir.path().join(name);
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        path
    }

    fn tone(ms: usize) -> Vec<i16> {
        (0..ms * 16)
            .map(|i| if i % 2 == 0 { 8000 } else { -8000 })
            .collect()
    }

    fn silence(ms: usize) -> Vec<i16> {
        vec![0; ms * 16]
    }

    #[test]
    fn test_parse_filter() {
        let cli = Cli::try_parse_from(["voicedj", "filter", "shape of you"]).unwrap();
        match cli.command {
            Commands::Filter { query } => assert_eq!(query, "shape of you"),
            _ => panic!("Expected Filter command"),
        }
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 0);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_verbose_double() {
        let cli = Cli::try_parse_from(["voicedj", "-vv", "correct", "bơ li vơ"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_parse_segment_defaults() {
        let cli = Cli::try_parse_from(["voicedj", "segment", "in.wav"]).unwrap();
        match cli.command {
            Commands::Segment {
                wav,
                speaker,
                frame,
                scan_interval,
                silence,
            } => {
                assert_eq!(wav, PathBuf::from("in.wav"));
                assert_eq!(speaker, 1);
                assert_eq!(frame, Duration::from_millis(20));
                assert!(scan_interval.is_none());
                assert!(silence.is_none());
            }
            _ => panic!("Expected Segment command"),
        }
    }

    #[test]
    fn test_parse_segment_durations() {
        let cli = Cli::try_parse_from([
            "voicedj",
            "segment",
            "in.wav",
            "--speaker",
            "42",
            "--scan-interval",
            "100",
            "--silence",
            "1s500ms",
        ])
        .unwrap();
        match cli.command {
            Commands::Segment {
                speaker,
                scan_interval,
                silence,
                ..
            } => {
                assert_eq!(speaker, 42);
                assert_eq!(scan_interval, Some(Duration::from_millis(100)));
                assert_eq!(silence, Some(Duration::from_millis(1500)));
            }
            _ => panic!("Expected Segment command"),
        }
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration_arg("soon").is_err());
        assert_eq!(parse_duration_arg(" 250 "), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration_arg("2s"), Ok(Duration::from_secs(2)));
    }

    #[test]
    fn test_parse_config_init_force() {
        let cli = Cli::try_parse_from(["voicedj", "config", "init", "--force"]).unwrap();
        match cli.command {
            Commands::Config {
                action: ConfigAction::Init { force },
            } => assert!(force),
            _ => panic!("Expected Config Init command"),
        }
    }

    #[test]
    fn test_global_options_after_command() {
        let cli = Cli::try_parse_from([
            "voicedj",
            "config",
            "show",
            "--config",
            "/tmp/voicedj.toml",
            "-q",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/voicedj.toml")));
        assert!(cli.quiet);
    }

    #[test]
    fn test_missing_command_is_error() {
        assert!(Cli::try_parse_from(["voicedj"]).is_err());
    }

    #[test]
    fn test_version_flag() {
        let err = Cli::try_parse_from(["voicedj", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn replay_cuts_one_utterance() {
        let dir = TempDir::new().unwrap();
        let mut samples = silence(500);
        samples.extend(tone(1000));
        samples.extend(silence(1500));
        let path = write_wav(&dir, "speech.wav", &samples);

        let report = replay_wav(
            &path,
            7,
            Duration::from_millis(20),
            default_scan_interval(),
            IngestConfig::default(),
        )
        .unwrap();

        assert_eq!(report.frames, 150);
        assert_eq!(report.segments.len(), 1);
        let segment = &report.segments[0];
        assert_eq!(segment.speaker, 7);
        assert!(segment.duration_ms >= 1000, "got {}", segment.duration_ms);
        assert!(segment.flushed_at_ms >= 2980, "got {}", segment.flushed_at_ms);
    }

    #[test]
    fn replay_of_silence_yields_nothing() {
        let dir = TempDir::new().unwrap();
        let path = write_wav(&dir, "quiet.wav", &silence(2000));

        let report = replay_wav(
            &path,
            1,
            Duration::from_millis(20),
            default_scan_interval(),
            IngestConfig::default(),
        )
        .unwrap();

        assert!(report.segments.is_empty());
        assert_eq!(report.discarded_short, 0);
    }

    #[test]
    fn replay_discards_blips() {
        let dir = TempDir::new().unwrap();
        let mut samples = silence(200);
        samples.extend(tone(100));
        samples.extend(silence(200));
        let path = write_wav(&dir, "blip.wav", &samples);

        let config = IngestConfig {
            silence_threshold: Duration::from_millis(100),
            ..IngestConfig::default()
        };
        let report =
            replay_wav(&path, 1, Duration::from_millis(20), default_scan_interval(), config)
                .unwrap();

        assert!(report.segments.is_empty());
        assert_eq!(report.discarded_short, 1);
    }

    #[test]
    fn replay_missing_file_is_error() {
        let result = replay_wav(
            Path::new("/nonexistent/voicedj.wav"),
            1,
            Duration::from_millis(20),
            default_scan_interval(),
            IngestConfig::default(),
        );
        assert!(result.is_err());
    }
}
