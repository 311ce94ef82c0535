//! Spoken-query correction for English song titles.
//!
//! Runs a phonetic substitution pass, a per-word misspelling pass, then
//! snaps to a catalog title when the result is close enough.

use crate::correction::similarity::{phonetic_similarity, ratio};
use crate::correction::tables;
use crate::defaults;
use std::collections::{HashMap, HashSet};

/// Longest pronunciation key, in words.
const MAX_PHRASE_WORDS: usize = 3;

/// Intermediate and final forms of one correction.
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    pub original: String,
    /// After the pronunciation pass only.
    pub phonetic: String,
    /// After pronunciation and misspelling passes.
    pub fixed: String,
    /// Catalog title and its score, when one was accepted.
    pub catalog_match: Option<(String, f64)>,
}

impl Correction {
    /// Best single query.
    pub fn best(&self) -> &str {
        self.catalog_match
            .as_ref()
            .map_or(self.fixed.as_str(), |(title, _)| title.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct QueryCorrector {
    pronunciation: HashMap<String, String>,
    typos: HashMap<String, String>,
    catalog: Vec<String>,
    match_threshold: f64,
    suggest_threshold: f64,
    phonetic_threshold: f64,
}

impl Default for QueryCorrector {
    fn default() -> Self {
        Self::new(
            defaults::CATALOG_MATCH_THRESHOLD,
            defaults::CATALOG_SUGGEST_THRESHOLD,
            defaults::PHONETIC_MATCH_THRESHOLD,
        )
    }
}

fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl QueryCorrector {
    pub fn new(match_threshold: f64, suggest_threshold: f64, phonetic_threshold: f64) -> Self {
        let pronunciation = tables::PRONUNCIATION_FIXES
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let typos = tables::TYPO_CORRECTIONS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            pronunciation,
            typos,
            catalog: tables::CATALOG.iter().map(|s| s.to_string()).collect(),
            match_threshold,
            suggest_threshold,
            phonetic_threshold,
        }
    }

    /// Add titles to the catalog.
    pub fn with_catalog(mut self, titles: impl IntoIterator<Item = String>) -> Self {
        for title in titles {
            let title = normalize(&title);
            if !title.is_empty() && !self.catalog.contains(&title) {
                self.catalog.push(title);
            }
        }
        self
    }

    /// Greedy left-to-right substitution, longest phrase first.
    pub fn apply_pronunciation_fixes(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered.split_whitespace().collect();
        let mut fixed: Vec<&str> = Vec::with_capacity(words.len());
        let mut i = 0;
        while i < words.len() {
            let hit = (1..=MAX_PHRASE_WORDS.min(words.len() - i))
                .rev()
                .find_map(|n| {
                    self.pronunciation
                        .get(&words[i..i + n].join(" "))
                        .map(|replacement| (n, replacement.as_str()))
                });
            match hit {
                Some((n, replacement)) => {
                    fixed.push(replacement);
                    i += n;
                }
                None => {
                    fixed.push(words[i]);
                    i += 1;
                }
            }
        }
        fixed.join(" ")
    }

    /// Per-word misspelling fixes.
    pub fn apply_typo_corrections(&self, text: &str) -> String {
        text.to_lowercase()
            .split_whitespace()
            .map(|w| self.typos.get(w).map_or(w, String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Top `n` catalog titles by similarity, best first.
    pub fn close_matches(&self, query: &str, n: usize) -> Vec<(String, f64)> {
        let query = normalize(query);
        let mut scored: Vec<(String, f64)> = self
            .catalog
            .iter()
            .map(|title| (title.clone(), ratio(&query, title)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(n);
        scored
    }

    fn best_title(&self, threshold: f64, score: impl Fn(&str) -> f64) -> Option<(String, f64)> {
        let mut best: Option<(String, f64)> = None;
        for title in &self.catalog {
            let s = score(title.as_str());
            if s >= threshold && best.as_ref().is_none_or(|(_, b)| s > *b) {
                best = Some((title.clone(), s));
            }
        }
        best
    }

    /// Best catalog title at or above the match threshold, falling back to
    /// a phonetic comparison of the whole string.
    pub fn find_catalog_match(&self, query: &str) -> Option<(String, f64)> {
        let query = normalize(query);
        self.best_title(self.match_threshold, |t| ratio(&query, t))
            .or_else(|| self.best_title(self.phonetic_threshold, |t| phonetic_similarity(&query, t)))
    }

    pub fn correct(&self, query: &str) -> Correction {
        let phonetic = self.apply_pronunciation_fixes(query);
        let fixed = self.apply_typo_corrections(&phonetic);
        let catalog_match = self.find_catalog_match(&fixed);
        match &catalog_match {
            Some((title, score)) => tracing::debug!(query, title = %title, score, "catalog match"),
            None if fixed != normalize(query) => tracing::debug!(query, corrected = %fixed, "corrected"),
            None => {}
        }
        Correction {
            original: query.to_string(),
            phonetic,
            fixed,
            catalog_match,
        }
    }

    /// Ordered, de-duplicated search variations, best first.
    pub fn variations(&self, query: &str) -> Vec<String> {
        let correction = self.correct(query);
        let best = correction.best().to_string();
        let mut out = vec![best.clone()];

        if !best.contains("song") {
            out.push(format!("{best} song"));
        }
        out.push(format!("{best} lyrics"));

        let typo_only = self.apply_typo_corrections(query);
        if typo_only != best {
            out.push(typo_only.clone());
        }
        let phonetic_only = correction.phonetic.clone();
        if phonetic_only != best && phonetic_only != typo_only {
            out.push(phonetic_only);
        }

        for (title, score) in self.close_matches(&best, 2) {
            if score >= self.suggest_threshold {
                out.push(title);
            }
        }

        let mut seen = HashSet::new();
        out.retain(|v| !v.is_empty() && seen.insert(v.clone()));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pronunciation_prefers_longest_phrase() {
        let corrector = QueryCorrector::default();
        assert_eq!(corrector.apply_pronunciation_fixes("xép ộp diu"), "shape of you");
        assert_eq!(corrector.apply_pronunciation_fixes("đen mon ki"), "dance monkey");
    }

    #[test]
    fn pronunciation_spans_do_not_overlap() {
        let corrector = QueryCorrector::default();
        // "bây bi" consumes both words; "lớp" is then its own word
        assert_eq!(corrector.apply_pronunciation_fixes("bây bi lớp"), "baby love");
    }

    #[test]
    fn later_duplicate_key_wins() {
        let corrector = QueryCorrector::default();
        assert_eq!(corrector.apply_pronunciation_fixes("lai"), "like");
        assert_eq!(corrector.apply_pronunciation_fixes("bay"), "bay");
    }

    #[test]
    fn unknown_words_pass_through() {
        let corrector = QueryCorrector::default();
        assert_eq!(corrector.apply_pronunciation_fixes("Sơn Tùng"), "sun tùng");
        assert_eq!(corrector.apply_pronunciation_fixes("xyzzy"), "xyzzy");
    }

    #[test]
    fn typo_pass_is_per_word() {
        let corrector = QueryCorrector::default();
        assert_eq!(
            corrector.apply_typo_corrections("somone like you"),
            "someone like you"
        );
    }

    #[test]
    fn catalog_snaps_close_queries() {
        let corrector = QueryCorrector::default();
        let correction = corrector.correct("shape of yu");
        assert_eq!(correction.best(), "shape of you");
        assert!(correction.catalog_match.unwrap().1 >= 0.65);
    }

    #[test]
    fn distant_query_keeps_corrected_text() {
        let corrector = QueryCorrector::default();
        let correction = corrector.correct("nơi này có anh");
        assert_eq!(correction.catalog_match, None);
        assert_eq!(correction.best(), correction.fixed);
    }

    #[test]
    fn variations_order_and_dedup() {
        let corrector = QueryCorrector::default();
        let variations = corrector.variations("xép ộp diu");
        assert_eq!(variations[0], "shape of you");
        assert_eq!(variations[1], "shape of you song");
        assert_eq!(variations[2], "shape of you lyrics");
        assert!(variations.contains(&"xép ộp diu".to_string()));
        let unique: HashSet<_> = variations.iter().collect();
        assert_eq!(unique.len(), variations.len());
    }

    #[test]
    fn variations_skip_song_suffix_when_present() {
        let corrector = QueryCorrector::default();
        let variations = corrector.variations("bài song ca hay nhất");
        assert_eq!(variations[0], "bài song ca hay nhất");
        assert_eq!(variations[1], "bài song ca hay nhất lyrics");
    }

    #[test]
    fn close_matches_are_sorted() {
        let corrector = QueryCorrector::default();
        let matches = corrector.close_matches("belever", 3);
        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].0, "believer");
        assert!(matches[0].1 >= matches[1].1 && matches[1].1 >= matches[2].1);
    }

    #[test]
    fn custom_catalog_titles_match() {
        let corrector = QueryCorrector::default().with_catalog(vec!["Lạc Trôi".to_string()]);
        assert_eq!(corrector.correct("lạc trôi").best(), "lạc trôi");
    }
}
