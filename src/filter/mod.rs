//! Content filter for spoken song requests.
//!
//! Abuse-resistant rather than restrictive: after the blacklist tiers and a
//! few degenerate-input checks, anything with at least two characters passes.

pub mod lexicon;

use crate::defaults;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Why a query was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Contains an always-blocked token.
    BlockedWord(String),
    /// Contains an offensive phrase built on a context word.
    OffensivePhrase(String),
    /// The whole query is a context word that may not stand alone.
    StandaloneWord(String),
    TooShort,
    TooLong { max: usize },
    /// Only digits, punctuation or symbols.
    NoLetters,
    /// A character repeated six or more times in a row.
    Repetition(char),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::BlockedWord(w) => write!(f, "inappropriate word '{w}'"),
            Rejection::OffensivePhrase(p) => write!(f, "inappropriate phrase '{p}'"),
            Rejection::StandaloneWord(w) => write!(f, "'{w}' is not a song request"),
            Rejection::TooShort => write!(f, "request too short"),
            Rejection::TooLong { max } => write!(f, "request longer than {max} characters"),
            Rejection::NoLetters => write!(f, "request has no letters"),
            Rejection::Repetition(c) => write!(f, "character '{c}' repeated too many times"),
        }
    }
}

/// Outcome of filtering one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allowed)
    }

    /// "OK" or the rejection message.
    pub fn reason(&self) -> String {
        match self {
            Verdict::Allowed => "OK".to_string(),
            Verdict::Rejected(r) => r.to_string(),
        }
    }
}

/// Two-tier lexical filter plus validity heuristics.
#[derive(Debug, Clone)]
pub struct ContentFilter {
    strict: HashSet<String>,
    context: HashMap<String, Vec<String>>,
    never_alone: HashSet<String>,
    safe_phrases: HashSet<String>,
    max_chars: usize,
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self::new(defaults::MAX_QUERY_CHARS)
    }
}

fn split_words(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

fn contains_words(haystack: &[&str], phrase: &str) -> bool {
    let needle = split_words(phrase);
    !needle.is_empty()
        && needle.len() <= haystack.len()
        && haystack.windows(needle.len()).any(|w| w == needle.as_slice())
}

fn longest_run(text: &str) -> Option<(char, usize)> {
    let mut best: Option<(char, usize)> = None;
    let mut current: Option<(char, usize)> = None;
    for c in text.chars() {
        current = match current {
            Some((prev, n)) if prev == c => Some((c, n + 1)),
            _ => Some((c, 1)),
        };
        if let Some((ch, n)) = current
            && best.is_none_or(|(_, m)| n > m)
        {
            best = Some((ch, n));
        }
    }
    best
}

impl ContentFilter {
    pub fn new(max_chars: usize) -> Self {
        Self {
            strict: lexicon::STRICT.iter().map(|s| s.to_string()).collect(),
            context: lexicon::CONTEXT
                .iter()
                .map(|(token, phrases)| {
                    (
                        token.to_string(),
                        phrases.iter().map(|p| p.to_string()).collect(),
                    )
                })
                .collect(),
            never_alone: lexicon::NEVER_ALONE.iter().map(|s| s.to_string()).collect(),
            safe_phrases: lexicon::SAFE_PHRASES.iter().map(|s| s.to_string()).collect(),
            max_chars,
        }
    }

    /// Add always-blocked tokens.
    pub fn with_blocked_words(mut self, words: impl IntoIterator<Item = String>) -> Self {
        self.strict
            .extend(words.into_iter().map(|w| w.trim().to_lowercase()).filter(|w| !w.is_empty()));
        self
    }

    /// Add full-query safe overrides.
    pub fn with_safe_phrases(mut self, phrases: impl IntoIterator<Item = String>) -> Self {
        self.safe_phrases
            .extend(phrases.into_iter().map(|p| p.trim().to_lowercase()).filter(|p| !p.is_empty()));
        self
    }

    pub fn check(&self, query: &str) -> Verdict {
        match self.rejection(query) {
            Some(rejection) => {
                tracing::debug!(query, %rejection, "request rejected");
                Verdict::Rejected(rejection)
            }
            None => Verdict::Allowed,
        }
    }

    fn rejection(&self, query: &str) -> Option<Rejection> {
        let lowered = query.trim().to_lowercase();
        let words = split_words(&lowered);

        // Strict tier
        if let Some(word) = words.iter().find(|w| self.strict.contains(**w)) {
            return Some(Rejection::BlockedWord(word.to_string()));
        }
        if let Some(token) = self
            .strict
            .iter()
            .filter(|t| t.chars().count() >= 4)
            .find(|t| lowered.contains(t.as_str()))
        {
            return Some(Rejection::BlockedWord(token.clone()));
        }

        // Context tier
        for word in &words {
            if let Some(phrases) = self.context.get(*word)
                && let Some(phrase) = phrases.iter().find(|p| contains_words(&words, p))
            {
                return Some(Rejection::OffensivePhrase(phrase.clone()));
            }
        }
        let joined = words.join(" ");
        let vouched = self.safe_phrases.contains(&joined) || words.len() >= 3;
        if !vouched
            && let [only] = words.as_slice()
            && self.context.contains_key(*only)
            && self.never_alone.contains(*only)
        {
            return Some(Rejection::StandaloneWord(only.to_string()));
        }

        self.validity(&lowered)
    }

    fn validity(&self, text: &str) -> Option<Rejection> {
        let len = text.chars().count();
        if len < 2 {
            return Some(Rejection::TooShort);
        }
        if len > self.max_chars {
            return Some(Rejection::TooLong {
                max: self.max_chars,
            });
        }
        if !text.chars().any(char::is_alphabetic) {
            return Some(Rejection::NoLetters);
        }
        if let Some((c, n)) = longest_run(text)
            && n >= 6
        {
            return Some(Rejection::Repetition(c));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed(q: &str) -> bool {
        ContentFilter::default().check(q).is_allowed()
    }

    #[test]
    fn strict_word_rejected() {
        let verdict = ContentFilter::default().check("đm");
        assert_eq!(verdict, Verdict::Rejected(Rejection::BlockedWord("đm".into())));
        assert!(!allowed("bài gì vậy đm"));
    }

    #[test]
    fn strict_long_token_matches_inside_words() {
        assert!(!allowed("superfuckingsong"));
        // Short strict tokens only match whole words
        assert!(allowed("admiral"));
    }

    #[test]
    fn context_word_in_long_query_allowed() {
        assert!(allowed("cho em một lần"));
        assert!(allowed("mẹ ơi con nhớ mẹ"));
    }

    #[test]
    fn standalone_context_word_rejected() {
        assert_eq!(
            ContentFilter::default().check("mẹ"),
            Verdict::Rejected(Rejection::StandaloneWord("mẹ".into()))
        );
        assert!(!allowed("  Chó "));
    }

    #[test]
    fn standalone_context_word_not_in_never_alone_allowed() {
        assert!(allowed("cho"));
        assert!(allowed("me"));
    }

    #[test]
    fn safe_override_allows_context_word() {
        assert!(allowed("call me maybe"));
        assert!(allowed("chó con"));
    }

    #[test]
    fn offensive_phrase_beats_word_count() {
        assert_eq!(
            ContentFilter::default().check("con mẹ mày"),
            Verdict::Rejected(Rejection::OffensivePhrase("con mẹ mày".into()))
        );
    }

    #[test]
    fn validity_heuristics() {
        let filter = ContentFilter::default();
        assert_eq!(filter.check("a"), Verdict::Rejected(Rejection::TooShort));
        assert_eq!(filter.check("!@#$%"), Verdict::Rejected(Rejection::NoLetters));
        assert_eq!(filter.check("1234 5678"), Verdict::Rejected(Rejection::NoLetters));
        assert_eq!(filter.check("aaaaaaah"), Verdict::Rejected(Rejection::Repetition('a')));
        assert!(filter.check("aaaaah").is_allowed());
        assert_eq!(
            filter.check(&"la ".repeat(40)),
            Verdict::Rejected(Rejection::TooLong { max: 100 })
        );
    }

    #[test]
    fn permissive_fallback() {
        assert!(allowed("despacito"));
        assert!(allowed("nắng ấm xa dần"));
        assert!(allowed("see tình"));
        assert!(allowed("7 rings"));
        assert!(allowed("tú"));
    }

    #[test]
    fn extra_lists() {
        let filter = ContentFilter::default()
            .with_blocked_words(vec!["Baby Shark".to_string(), "shark".to_string()])
            .with_safe_phrases(vec!["cave".to_string()]);
        assert!(!filter.check("baby shark").is_allowed());
        assert!(filter.check("cave").is_allowed());
    }

    #[test]
    fn reason_strings() {
        assert_eq!(Verdict::Allowed.reason(), "OK");
        assert_eq!(
            Verdict::Rejected(Rejection::TooShort).reason(),
            "request too short"
        );
    }
}
