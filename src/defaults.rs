//! Default configuration constants for voicedj.
//!
//! Shared by the config layer and by components constructed directly in tests,
//! so both agree on the tuning values.

/// Sample rate delivered by the voice transport, in Hz.
pub const TRANSPORT_SAMPLE_RATE: u32 = 48_000;

/// Channel count delivered by the voice transport.
pub const TRANSPORT_CHANNELS: u16 = 2;

/// Interval of one transport frame in milliseconds.
pub const FRAME_MS: u32 = 20;

/// Normalized RMS noise floor (0.0 to 1.0).
///
/// Frames at or below this level count as silence. Roughly 50 on the raw
/// 16-bit amplitude scale.
pub const NOISE_FLOOR: f32 = 0.0015;

/// Silence after the last loud frame before an utterance is considered over.
pub const SILENCE_THRESHOLD_MS: u64 = 1500;

/// Utterances shorter than this never reach recognition.
pub const MIN_UTTERANCE_MS: u64 = 800;

/// Minimum spacing between two flushes of the same speaker.
pub const MIN_FLUSH_INTERVAL_MS: u64 = 2000;

/// Period of the background silence scan.
pub const SCAN_INTERVAL_MS: u64 = 200;

/// Language tried first; wins whenever it hears a control token.
pub const PRIMARY_LANGUAGE: &str = "vi-VN";

/// Language preferred for song titles.
pub const SECONDARY_LANGUAGE: &str = "en-US";

/// Secondary result is kept when its length is at least this share of the primary.
pub const SECONDARY_LENGTH_RATIO: f32 = 0.7;

/// Identical phrases within this window are delivered once.
pub const DUPLICATE_WINDOW_MS: u64 = 5000;

/// Capacity of the recognized-phrase delivery queue.
pub const DELIVERY_CAPACITY: usize = 32;

/// Length of the command window opened by a wake token.
pub const COMMAND_WINDOW_SECS: u64 = 10;

/// Lifetime of the speaker priority lock.
pub const LOCK_TTL_SECS: u64 = 15;

/// Debounce for repeated skip commands.
pub const SKIP_COOLDOWN_MS: u64 = 3000;

/// Candidates requested from the media search provider per variation.
pub const SEARCH_CANDIDATE_LIMIT: usize = 15;

/// Candidates shorter than this are not music.
pub const MIN_TRACK_SECS: u64 = 60;

/// Candidates longer than this are not single tracks.
pub const MAX_TRACK_SECS: u64 = 7200;

/// Catalog title replaces the corrected query at or above this similarity.
pub const CATALOG_MATCH_THRESHOLD: f64 = 0.65;

/// Catalog titles at or above this similarity become retry variations.
pub const CATALOG_SUGGEST_THRESHOLD: f64 = 0.5;

/// Whole-string phonetic similarity that also accepts a catalog title.
pub const PHONETIC_MATCH_THRESHOLD: f64 = 0.9;

/// Maximum query length accepted by the content filter (characters).
pub const MAX_QUERY_CHARS: usize = 100;

/// Default wake tokens, longest first when matched.
pub const WAKE_TOKENS: &[&str] = &["luna", "lu na", "lú na", "lủ na", "mở bài", "mở"];

/// Tokens that make the primary-language transcript win arbitration.
pub const CONTROL_TOKENS: &[&str] = &[
    "luna",
    "chuyển bài",
    "ngắt kết nối",
    "bài hiện tại",
    "ngắt",
    "kết nối",
];

/// Exact phrases that disconnect without opening a window.
pub const DIRECT_DISCONNECT: &[&str] = &[
    "luna disconnect",
    "luna ngắt kết nối",
    "luna thoát",
    "luna cút",
    "luna bye",
];

/// Exact phrases that skip without opening a window.
pub const DIRECT_SKIP: &[&str] = &[
    "luna skip",
    "luna chuyển bài",
    "luna bỏ qua",
    "luna qua bài",
    "luna bài tiếp",
    "luna next",
];

/// Exact phrases that report the current track without opening a window.
pub const DIRECT_NOW_PLAYING: &[&str] = &[
    "luna bài hiện tại",
    "luna đang phát",
    "luna bài gì",
    "luna now playing",
    "luna bài này là gì",
];

/// In-window phrases that end the session.
pub const WINDOW_DISCONNECT: &[&str] = &[
    "leave",
    "stop",
    "exit",
    "disconnect",
    "bye",
    "thoát",
    "cút",
    "ngắt kết nối",
];

/// In-window phrases that skip the current track.
pub const WINDOW_SKIP: &[&str] = &["skip", "next", "bỏ qua", "chuyển bài", "qua bài", "bài tiếp"];

/// In-window phrases that report the current track.
pub const WINDOW_NOW_PLAYING: &[&str] = &[
    "now playing",
    "what song",
    "bài hiện tại",
    "đang phát",
    "bài gì",
    "bài này là gì",
];

/// Leading words stripped from a song request.
pub const TRIGGER_PREFIXES: &[&str] = &[
    "play music",
    "phát nhạc",
    "mở bài",
    "bật bài",
    "play bài",
    "open song",
    "mở",
    "play",
];
