//! Error types for voicedj.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceDjError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    // Audio errors
    #[error("Audio format mismatch: expected {expected}, got {actual}")]
    AudioFormatMismatch { expected: String, actual: String },

    #[error("Audio conversion failed: {message}")]
    AudioConversion { message: String },

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    // Recognition errors
    #[error("Recognition failed for {language}: {message}")]
    Recognition { language: String, message: String },

    // Search and resolution errors
    #[error("Media search failed for '{query}': {message}")]
    Search { query: String, message: String },

    #[error("Stream resolution failed for '{locator}': {message}")]
    Resolution { locator: String, message: String },

    #[error("No playable track found for '{query}'")]
    NoUsableCandidate { query: String },

    #[error("Playlist expansion failed for '{playlist}': {message}")]
    PlaylistExpansion { playlist: String, message: String },

    // Playback errors
    #[error("Playback failed: {message}")]
    Playback { message: String },

    // Session errors
    #[error("Voice session is disconnected")]
    Disconnected,

    #[error("Request '{query}' rejected: {reason}")]
    Rejected { query: String, reason: String },

    #[error("Task '{task}' failed: {message}")]
    TaskFailed { task: String, message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, VoiceDjError>;
