use crate::correction::QueryCorrector;
use crate::defaults;
use crate::error::{Result, VoiceDjError};
use crate::filter::ContentFilter;
use crate::ingest::IngestConfig;
use crate::media::ResolverConfig;
use crate::session::{DispatcherConfig, PhraseTables};
use crate::stt::ArbiterConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub recognition: RecognitionConfig,
    pub commands: CommandsConfig,
    pub filter: FilterConfig,
    pub search: SearchConfig,
}

/// Buffering and segmentation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    /// Normalized RMS (0.0 to 1.0) a frame must exceed to count as speech
    pub noise_floor: f32,
    pub silence_threshold_ms: u64,
    pub min_utterance_ms: u64,
    pub min_flush_interval_ms: u64,
    pub scan_interval_ms: u64,
}

/// Dual-language recognition and arbitration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecognitionConfig {
    pub primary_language: String,
    pub secondary_language: String,
    pub secondary_length_ratio: f32,
    pub duplicate_window_ms: u64,
    /// Tokens that make the primary transcript win
    pub control_tokens: Vec<String>,
    /// Drop phrases without a wake token unless the speaker holds the lock
    pub require_wake_token: bool,
    pub delivery_capacity: usize,
}

/// Wake tokens, command phrases and their timeouts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CommandsConfig {
    pub wake_tokens: Vec<String>,
    pub window_secs: u64,
    pub lock_ttl_secs: u64,
    pub skip_cooldown_ms: u64,
    pub direct_disconnect: Vec<String>,
    pub direct_skip: Vec<String>,
    pub direct_now_playing: Vec<String>,
    pub window_disconnect: Vec<String>,
    pub window_skip: Vec<String>,
    pub window_now_playing: Vec<String>,
    pub trigger_prefixes: Vec<String>,
}

/// Content filter additions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    pub max_chars: usize,
    pub blocked_words: Vec<String>,
    pub safe_phrases: Vec<String>,
}

/// Track search, ranking and correction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub candidate_limit: usize,
    pub min_track_secs: u64,
    pub max_track_secs: u64,
    pub catalog_match_threshold: f64,
    pub catalog_suggest_threshold: f64,
    pub phonetic_match_threshold: f64,
    /// Extra titles for catalog matching
    pub catalog: Vec<String>,
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            noise_floor: defaults::NOISE_FLOOR,
            silence_threshold_ms: defaults::SILENCE_THRESHOLD_MS,
            min_utterance_ms: defaults::MIN_UTTERANCE_MS,
            min_flush_interval_ms: defaults::MIN_FLUSH_INTERVAL_MS,
            scan_interval_ms: defaults::SCAN_INTERVAL_MS,
        }
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            primary_language: defaults::PRIMARY_LANGUAGE.to_string(),
            secondary_language: defaults::SECONDARY_LANGUAGE.to_string(),
            secondary_length_ratio: defaults::SECONDARY_LENGTH_RATIO,
            duplicate_window_ms: defaults::DUPLICATE_WINDOW_MS,
            control_tokens: owned(defaults::CONTROL_TOKENS),
            require_wake_token: true,
            delivery_capacity: defaults::DELIVERY_CAPACITY,
        }
    }
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            wake_tokens: owned(defaults::WAKE_TOKENS),
            window_secs: defaults::COMMAND_WINDOW_SECS,
            lock_ttl_secs: defaults::LOCK_TTL_SECS,
            skip_cooldown_ms: defaults::SKIP_COOLDOWN_MS,
            direct_disconnect: owned(defaults::DIRECT_DISCONNECT),
            direct_skip: owned(defaults::DIRECT_SKIP),
            direct_now_playing: owned(defaults::DIRECT_NOW_PLAYING),
            window_disconnect: owned(defaults::WINDOW_DISCONNECT),
            window_skip: owned(defaults::WINDOW_SKIP),
            window_now_playing: owned(defaults::WINDOW_NOW_PLAYING),
            trigger_prefixes: owned(defaults::TRIGGER_PREFIXES),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_chars: defaults::MAX_QUERY_CHARS,
            blocked_words: Vec::new(),
            safe_phrases: Vec::new(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            candidate_limit: defaults::SEARCH_CANDIDATE_LIMIT,
            min_track_secs: defaults::MIN_TRACK_SECS,
            max_track_secs: defaults::MAX_TRACK_SECS,
            catalog_match_threshold: defaults::CATALOG_MATCH_THRESHOLD,
            catalog_suggest_threshold: defaults::CATALOG_SUGGEST_THRESHOLD,
            phonetic_match_threshold: defaults::PHONETIC_MATCH_THRESHOLD,
            catalog: Vec::new(),
        }
    }
}

fn invalid(key: &str, message: &str) -> VoiceDjError {
    VoiceDjError::ConfigInvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

fn require_positive(key: &str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(invalid(key, "must be positive"));
    }
    Ok(())
}

fn require_unit_ratio(key: &str, value: f64) -> Result<()> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(invalid(key, "must be in (0, 1]"));
    }
    Ok(())
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing fields use default values. A missing file is
    /// [`VoiceDjError::ConfigFileNotFound`].
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => VoiceDjError::ConfigFileNotFound {
                path: path.display().to_string(),
            },
            _ => VoiceDjError::Io(e),
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(VoiceDjError::ConfigFileNotFound { .. }) => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - VOICEDJ_PRIMARY_LANGUAGE → recognition.primary_language
    /// - VOICEDJ_SECONDARY_LANGUAGE → recognition.secondary_language
    /// - VOICEDJ_WAKE_TOKENS → commands.wake_tokens (comma separated)
    /// - VOICEDJ_NOISE_FLOOR → audio.noise_floor
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(language) = std::env::var("VOICEDJ_PRIMARY_LANGUAGE")
            && !language.is_empty()
        {
            self.recognition.primary_language = language;
        }

        if let Ok(language) = std::env::var("VOICEDJ_SECONDARY_LANGUAGE")
            && !language.is_empty()
        {
            self.recognition.secondary_language = language;
        }

        if let Ok(tokens) = std::env::var("VOICEDJ_WAKE_TOKENS") {
            let tokens: Vec<String> = tokens
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            if !tokens.is_empty() {
                self.commands.wake_tokens = tokens;
            }
        }

        if let Ok(floor) = std::env::var("VOICEDJ_NOISE_FLOOR") {
            match floor.parse::<f32>() {
                Ok(value) => self.audio.noise_floor = value,
                Err(_) if floor.is_empty() => {}
                Err(e) => tracing::warn!(value = %floor, "ignoring VOICEDJ_NOISE_FLOOR: {e}"),
            }
        }

        self
    }

    /// Reject values that would make the pipeline misbehave.
    pub fn validate(&self) -> Result<()> {
        if !(self.audio.noise_floor >= 0.0 && self.audio.noise_floor < 1.0) {
            return Err(invalid("audio.noise_floor", "must be in [0, 1)"));
        }
        require_positive("audio.silence_threshold_ms", self.audio.silence_threshold_ms)?;
        require_positive("audio.min_utterance_ms", self.audio.min_utterance_ms)?;
        require_positive("audio.min_flush_interval_ms", self.audio.min_flush_interval_ms)?;
        require_positive("audio.scan_interval_ms", self.audio.scan_interval_ms)?;

        require_unit_ratio(
            "recognition.secondary_length_ratio",
            f64::from(self.recognition.secondary_length_ratio),
        )?;
        require_positive("recognition.duplicate_window_ms", self.recognition.duplicate_window_ms)?;
        require_positive(
            "recognition.delivery_capacity",
            self.recognition.delivery_capacity as u64,
        )?;
        if self.recognition.primary_language.trim().is_empty()
            || self.recognition.secondary_language.trim().is_empty()
        {
            return Err(invalid("recognition", "both languages must be set"));
        }

        if self.commands.wake_tokens.iter().all(|t| t.trim().is_empty()) {
            return Err(invalid("commands.wake_tokens", "must not be empty"));
        }
        require_positive("commands.window_secs", self.commands.window_secs)?;
        require_positive("commands.lock_ttl_secs", self.commands.lock_ttl_secs)?;
        require_positive("commands.skip_cooldown_ms", self.commands.skip_cooldown_ms)?;

        require_positive("filter.max_chars", self.filter.max_chars as u64)?;

        require_positive("search.candidate_limit", self.search.candidate_limit as u64)?;
        if self.search.min_track_secs >= self.search.max_track_secs {
            return Err(invalid(
                "search.min_track_secs",
                "must be below search.max_track_secs",
            ));
        }
        require_unit_ratio("search.catalog_match_threshold", self.search.catalog_match_threshold)?;
        require_unit_ratio(
            "search.catalog_suggest_threshold",
            self.search.catalog_suggest_threshold,
        )?;
        require_unit_ratio(
            "search.phonetic_match_threshold",
            self.search.phonetic_match_threshold,
        )?;
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/voicedj/config.toml on Linux
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("voicedj").join("config.toml"))
            .ok_or_else(|| VoiceDjError::Other("could not determine config directory".to_string()))
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn ingest(&self) -> IngestConfig {
        IngestConfig {
            noise_floor: self.audio.noise_floor,
            silence_threshold: Duration::from_millis(self.audio.silence_threshold_ms),
            min_utterance: Duration::from_millis(self.audio.min_utterance_ms),
            min_flush_interval: Duration::from_millis(self.audio.min_flush_interval_ms),
        }
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.audio.scan_interval_ms)
    }

    pub fn arbiter(&self) -> ArbiterConfig {
        ArbiterConfig {
            primary_language: self.recognition.primary_language.clone(),
            secondary_language: self.recognition.secondary_language.clone(),
            secondary_length_ratio: self.recognition.secondary_length_ratio,
            duplicate_window: Duration::from_millis(self.recognition.duplicate_window_ms),
            control_tokens: self.recognition.control_tokens.clone(),
            require_wake_token: self.recognition.require_wake_token,
        }
    }

    pub fn phrase_tables(&self) -> PhraseTables {
        let c = &self.commands;
        PhraseTables::new(c.wake_tokens.clone())
            .with_direct_phrases(
                c.direct_disconnect.clone(),
                c.direct_skip.clone(),
                c.direct_now_playing.clone(),
            )
            .with_window_phrases(
                c.window_disconnect.clone(),
                c.window_skip.clone(),
                c.window_now_playing.clone(),
            )
            .with_trigger_prefixes(c.trigger_prefixes.clone())
    }

    pub fn dispatcher(&self) -> DispatcherConfig {
        DispatcherConfig {
            command_window: Duration::from_secs(self.commands.window_secs),
            skip_cooldown: Duration::from_millis(self.commands.skip_cooldown_ms),
        }
    }

    pub fn lock_ttl(&self) -> Duration {
        Duration::from_secs(self.commands.lock_ttl_secs)
    }

    pub fn content_filter(&self) -> ContentFilter {
        ContentFilter::new(self.filter.max_chars)
            .with_blocked_words(self.filter.blocked_words.clone())
            .with_safe_phrases(self.filter.safe_phrases.clone())
    }

    pub fn query_corrector(&self) -> QueryCorrector {
        QueryCorrector::new(
            self.search.catalog_match_threshold,
            self.search.catalog_suggest_threshold,
            self.search.phonetic_match_threshold,
        )
        .with_catalog(self.search.catalog.clone())
    }

    pub fn resolver(&self) -> ResolverConfig {
        ResolverConfig {
            candidate_limit: self.search.candidate_limit,
            min_track_secs: self.search.min_track_secs,
            max_track_secs: self.search.max_track_secs,
        }
    }
}
