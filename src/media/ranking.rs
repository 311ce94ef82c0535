//! Candidate filtering and scoring for track search.
//!
//! Scores are additive integers. A candidate only wins when its score is
//! strictly positive; otherwise the resolver moves on to the next variation.

use crate::defaults;
use crate::media::provider::MediaCandidate;
use crate::session::phrases::{contains_phrase, normalize};

/// Title keywords that suggest an actual music upload.
pub const MUSIC_INDICATORS: &[&str] = &[
    "official",
    "audio",
    "lyrics",
    "lyric",
    "music video",
    "mv",
    "m v",
    "official video",
    "visualizer",
];

/// Query keywords that already point a search at music, so no augmented
/// copies are needed.
pub const QUERY_INDICATORS: &[&str] = &[
    "official", "audio", "lyrics", "lyric", "mv", "song", "karaoke", "live", "cover", "remix",
    "acoustic", "instrumental",
];

/// Title keywords that disqualify a candidate outright.
pub const NON_MUSIC: &[&str] = &[
    "gameplay",
    "tutorial",
    "reaction",
    "react",
    "podcast",
    "compilation",
    "slowed",
    "nightcore",
    "sped up",
    "8d audio",
    "review",
    "interview",
    "trailer",
    "highlights",
    "how to",
    "lesson",
    "hướng dẫn",
];

/// Derivative versions. Penalized unless the request asked for one.
pub const REMIX_WORDS: &[&str] = &["remix", "mashup", "bootleg", "edm", "vinahouse"];

const INDICATOR_POINTS: i32 = 10;
const INDICATOR_CAP: i32 = 20;
const TOPIC_CHANNEL_POINTS: i32 = 50;
const VEVO_POINTS: i32 = 40;
const OFFICIAL_CHANNEL_POINTS: i32 = 30;
const IDEAL_DURATION_POINTS: i32 = 20;
const OK_DURATION_POINTS: i32 = 10;
const LONG_DURATION_PENALTY: i32 = -20;
const QUERY_WORD_POINTS: i32 = 5;
const LITERAL_MATCH_POINTS: i32 = 80;
const REMIX_POINTS: i32 = 25;

fn any_keyword(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| contains_phrase(text, k))
}

/// Whether a search query already carries a music keyword.
pub fn has_music_indicator(query: &str) -> bool {
    any_keyword(&normalize(query), QUERY_INDICATORS)
}

/// Whether the raw request asked for a remix-style version.
pub fn wants_remix(raw_query: &str) -> bool {
    any_keyword(&normalize(raw_query), REMIX_WORDS)
}

/// Scores candidates against one request.
#[derive(Debug, Clone)]
pub struct CandidateRanker {
    min_secs: u64,
    max_secs: u64,
}

impl Default for CandidateRanker {
    fn default() -> Self {
        Self::new(defaults::MIN_TRACK_SECS, defaults::MAX_TRACK_SECS)
    }
}

impl CandidateRanker {
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self { min_secs, max_secs }
    }

    /// Hard exclusion: shorts, out-of-range durations, non-music titles.
    /// Unknown durations are kept.
    pub fn is_excluded(&self, candidate: &MediaCandidate) -> bool {
        let title = normalize(&candidate.title);
        if candidate.is_short || contains_phrase(&title, "shorts") {
            return true;
        }
        if let Some(secs) = candidate.duration_secs
            && (secs < self.min_secs || secs > self.max_secs)
        {
            return true;
        }
        any_keyword(&title, NON_MUSIC)
    }

    /// Score one candidate. `query` is the variation searched, `raw_query`
    /// the request as spoken.
    pub fn score(&self, candidate: &MediaCandidate, query: &str, raw_query: &str) -> i32 {
        let title = normalize(&candidate.title);
        let uploader = candidate.uploader.to_lowercase();
        let raw = normalize(raw_query);
        let mut score = 0;

        let indicators = MUSIC_INDICATORS
            .iter()
            .filter(|k| contains_phrase(&title, k))
            .count() as i32;
        score += (indicators * INDICATOR_POINTS).min(INDICATOR_CAP);

        if uploader.ends_with(" - topic") {
            score += TOPIC_CHANNEL_POINTS;
        } else if uploader.contains("vevo") {
            score += VEVO_POINTS;
        } else if uploader.contains("official") {
            score += OFFICIAL_CHANNEL_POINTS;
        }

        score += match candidate.duration_secs {
            Some(120..=420) => IDEAL_DURATION_POINTS,
            Some(60..=600) => OK_DURATION_POINTS,
            Some(_) => LONG_DURATION_PENALTY,
            None => 0,
        };

        let query = normalize(query);
        let matched_words = query
            .split_whitespace()
            .filter(|w| w.chars().count() >= 2 && contains_phrase(&title, w))
            .count() as i32;
        score += matched_words * QUERY_WORD_POINTS;

        if !raw.is_empty() && title.contains(&raw) {
            score += LITERAL_MATCH_POINTS;
        }

        if any_keyword(&title, REMIX_WORDS) {
            score += if wants_remix(&raw) {
                REMIX_POINTS
            } else {
                -REMIX_POINTS
            };
        }

        score
    }

    /// Highest-scoring usable candidate, if any scored above zero.
    /// Ties keep the provider's order.
    pub fn best<'a>(
        &self,
        candidates: &'a [MediaCandidate],
        query: &str,
        raw_query: &str,
    ) -> Option<(&'a MediaCandidate, i32)> {
        let mut best: Option<(&MediaCandidate, i32)> = None;
        for candidate in candidates {
            if self.is_excluded(candidate) {
                tracing::trace!(title = %candidate.title, "excluded");
                continue;
            }
            let score = self.score(candidate, query, raw_query);
            tracing::trace!(title = %candidate.title, score, "scored");
            if score > 0 && best.is_none_or(|(_, b)| score > b) {
                best = Some((candidate, score));
            }
        }
        best
    }
}

/// Expand search variations with "official audio" and "official music
/// video" copies after each one that lacks a music keyword.
pub fn augment_variations(variations: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(variations.len() * 3);
    for variation in variations {
        out.push(variation.clone());
        if !has_music_indicator(variation) {
            out.push(format!("{variation} official audio"));
            out.push(format!("{variation} official music video"));
        }
    }
    let mut seen = std::collections::HashSet::new();
    out.retain(|v| seen.insert(v.clone()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(title: &str, uploader: &str, secs: Option<u64>) -> MediaCandidate {
        MediaCandidate {
            title: title.to_string(),
            uploader: uploader.to_string(),
            duration_secs: secs,
            page_ref: format!("page:{title}"),
            thumbnail: None,
            is_short: false,
        }
    }

    #[test]
    fn excludes_shorts_and_bad_durations() {
        let ranker = CandidateRanker::default();
        let mut short = candidate("Lạc Trôi", "x", Some(200));
        short.is_short = true;
        assert!(ranker.is_excluded(&short));
        assert!(ranker.is_excluded(&candidate("Lạc Trôi #shorts", "x", Some(30))));
        assert!(ranker.is_excluded(&candidate("Lạc Trôi", "x", Some(59))));
        assert!(ranker.is_excluded(&candidate("Lạc Trôi 10 hours", "x", Some(36_000))));
        assert!(!ranker.is_excluded(&candidate("Lạc Trôi", "x", None)));
    }

    #[test]
    fn excludes_non_music_titles() {
        let ranker = CandidateRanker::default();
        assert!(ranker.is_excluded(&candidate("Believer (Slowed + Reverb)", "x", Some(200))));
        assert!(ranker.is_excluded(&candidate("Believer Reaction!!", "x", Some(400))));
        assert!(ranker.is_excluded(&candidate("Guitar tutorial: Believer", "x", Some(400))));
        assert!(!ranker.is_excluded(&candidate("Believer (Official Video)", "x", Some(204))));
    }

    #[test]
    fn literal_query_match_wins() {
        let ranker = CandidateRanker::default();
        let literal = candidate("Nơi Này Có Anh | Sơn Tùng M-TP", "random uploader", Some(260));
        let other = candidate("Noi Nay Co Anh (Official Audio)", "random uploader", Some(260));
        let raw = "nơi này có anh";
        let literal_score = ranker.score(&literal, "noi nay co anh", raw);
        let other_score = ranker.score(&other, "noi nay co anh", raw);
        assert!(literal_score > other_score, "{literal_score} <= {other_score}");

        let pool = [other.clone(), literal.clone()];
        let (best, _) = ranker.best(&pool, "noi nay co anh", raw).unwrap();
        assert_eq!(best.title, literal.title);
    }

    #[test]
    fn remix_preference_follows_request() {
        let ranker = CandidateRanker::default();
        let remix = candidate("Believer Remix", "uploader", Some(210));
        let plain = candidate("Believer Audio", "uploader", Some(210));

        assert!(
            ranker.score(&remix, "believer remix", "believer remix")
                > ranker.score(&plain, "believer remix", "believer remix")
        );
        assert!(
            ranker.score(&plain, "believer", "believer")
                > ranker.score(&remix, "believer", "believer")
        );
    }

    #[test]
    fn official_channels_score_higher() {
        let ranker = CandidateRanker::default();
        let topic = ranker.score(&candidate("Believer", "Imagine Dragons - Topic", Some(204)), "believer", "believer");
        let vevo = ranker.score(&candidate("Believer", "ImagineDragonsVEVO", Some(204)), "believer", "believer");
        let fan = ranker.score(&candidate("Believer", "fan account", Some(204)), "believer", "believer");
        assert!(topic > vevo && vevo > fan);
    }

    #[test]
    fn duration_bands() {
        let ranker = CandidateRanker::default();
        let score = |secs| ranker.score(&candidate("x", "y", Some(secs)), "", "");
        assert_eq!(score(200), 20);
        assert_eq!(score(90), 10);
        assert_eq!(score(500), 10);
        assert_eq!(score(900), -20);
    }

    #[test]
    fn non_positive_scores_are_not_usable() {
        let ranker = CandidateRanker::default();
        let pool = [candidate("Completely Unrelated", "someone", Some(1200))];
        assert!(ranker.best(&pool, "believer", "believer").is_none());
    }

    #[test]
    fn augmentation_skips_music_queries() {
        let out = augment_variations(&["believer".to_string(), "believer lyrics".to_string()]);
        assert_eq!(
            out,
            vec![
                "believer",
                "believer official audio",
                "believer official music video",
                "believer lyrics",
            ]
        );
    }
}
