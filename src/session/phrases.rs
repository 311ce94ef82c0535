//! Phrase tables and word-boundary matching for voice commands.

use crate::defaults;
use crate::pipeline::events::ControlAction;

/// Lowercase, turn punctuation into spaces, collapse whitespace.
///
/// Apostrophes, hyphens and ampersands survive since they appear in titles.
pub fn normalize(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            let is_punct = (c.is_ascii_punctuation() && !matches!(c, '\'' | '-' | '&'))
                || matches!(c, '…' | '“' | '”' | '‘' | '’' | '«' | '»' | '¿' | '¡');
            if is_punct { ' ' } else { c }
        })
        .collect();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Index of the first word where `phrase` starts in `haystack`.
fn find_words(haystack: &[&str], phrase: &[&str]) -> Option<usize> {
    if phrase.is_empty() || phrase.len() > haystack.len() {
        return None;
    }
    haystack.windows(phrase.len()).position(|w| w == phrase)
}

/// Whether `phrase` occurs in `text` on word boundaries. Both normalized.
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    find_words(&words(text), &words(phrase)).is_some()
}

/// A wake token located inside a phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeMatch {
    pub token: String,
    /// Words after the token, if any.
    pub trailing: Option<String>,
}

/// The command vocabulary of one session.
#[derive(Debug, Clone)]
pub struct PhraseTables {
    wake_tokens: Vec<String>,
    direct_disconnect: Vec<String>,
    direct_skip: Vec<String>,
    direct_now_playing: Vec<String>,
    window_disconnect: Vec<String>,
    window_skip: Vec<String>,
    window_now_playing: Vec<String>,
    trigger_prefixes: Vec<String>,
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn prepared(list: Vec<String>) -> Vec<String> {
    let mut list: Vec<String> = list
        .iter()
        .map(|s| normalize(s))
        .filter(|s| !s.is_empty())
        .collect();
    // Longest first so "mở bài" beats "mở".
    list.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));
    list.dedup();
    list
}

impl Default for PhraseTables {
    fn default() -> Self {
        Self::new(owned(defaults::WAKE_TOKENS))
    }
}

impl PhraseTables {
    /// Tables with the given wake tokens and the default control phrases.
    pub fn new(wake_tokens: Vec<String>) -> Self {
        Self {
            wake_tokens: prepared(wake_tokens),
            direct_disconnect: prepared(owned(defaults::DIRECT_DISCONNECT)),
            direct_skip: prepared(owned(defaults::DIRECT_SKIP)),
            direct_now_playing: prepared(owned(defaults::DIRECT_NOW_PLAYING)),
            window_disconnect: prepared(owned(defaults::WINDOW_DISCONNECT)),
            window_skip: prepared(owned(defaults::WINDOW_SKIP)),
            window_now_playing: prepared(owned(defaults::WINDOW_NOW_PLAYING)),
            trigger_prefixes: prepared(owned(defaults::TRIGGER_PREFIXES)),
        }
    }

    pub fn with_direct_phrases(
        mut self,
        disconnect: Vec<String>,
        skip: Vec<String>,
        now_playing: Vec<String>,
    ) -> Self {
        self.direct_disconnect = prepared(disconnect);
        self.direct_skip = prepared(skip);
        self.direct_now_playing = prepared(now_playing);
        self
    }

    pub fn with_window_phrases(
        mut self,
        disconnect: Vec<String>,
        skip: Vec<String>,
        now_playing: Vec<String>,
    ) -> Self {
        self.window_disconnect = prepared(disconnect);
        self.window_skip = prepared(skip);
        self.window_now_playing = prepared(now_playing);
        self
    }

    pub fn with_trigger_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.trigger_prefixes = prepared(prefixes);
        self
    }

    pub fn wake_tokens(&self) -> &[String] {
        &self.wake_tokens
    }

    fn exact(
        text: &str,
        disconnect: &[String],
        skip: &[String],
        now_playing: &[String],
    ) -> Option<ControlAction> {
        let text = normalize(text);
        if disconnect.contains(&text) {
            Some(ControlAction::Disconnect)
        } else if skip.contains(&text) {
            Some(ControlAction::Skip)
        } else if now_playing.contains(&text) {
            Some(ControlAction::NowPlaying)
        } else {
            None
        }
    }

    /// Exact direct-control phrase, honored while idle.
    pub fn direct_control(&self, text: &str) -> Option<ControlAction> {
        Self::exact(
            text,
            &self.direct_disconnect,
            &self.direct_skip,
            &self.direct_now_playing,
        )
    }

    /// Exact in-window control phrase.
    pub fn window_control(&self, text: &str) -> Option<ControlAction> {
        Self::exact(
            text,
            &self.window_disconnect,
            &self.window_skip,
            &self.window_now_playing,
        )
    }

    /// Earliest wake token in `text`; the longest one wins at the same position.
    pub fn find_wake(&self, text: &str) -> Option<WakeMatch> {
        let text = normalize(text);
        let haystack = words(&text);

        let mut best: Option<(usize, usize, &String)> = None;
        for token in &self.wake_tokens {
            let needle = words(token);
            if let Some(start) = find_words(&haystack, &needle)
                && best.is_none_or(|(s, _, _)| start < s)
            {
                best = Some((start, needle.len(), token));
            }
        }

        best.map(|(start, len, token)| {
            let rest = haystack[start + len..].join(" ");
            WakeMatch {
                token: token.clone(),
                trailing: (!rest.is_empty()).then_some(rest),
            }
        })
    }

    /// Whether `text` could matter to the dispatcher at all.
    pub fn is_relevant(&self, text: &str) -> bool {
        let text = normalize(text);
        self.wake_tokens.iter().any(|t| contains_phrase(&text, t))
            || self
                .direct_disconnect
                .iter()
                .chain(&self.direct_skip)
                .chain(&self.direct_now_playing)
                .any(|p| contains_phrase(&text, p))
    }

    /// Strip leading wake tokens and trigger words from a song request.
    pub fn strip_triggers(&self, text: &str) -> String {
        let text = normalize(text);
        let mut rest: Vec<&str> = words(&text);
        loop {
            let prefix = self
                .wake_tokens
                .iter()
                .chain(&self.trigger_prefixes)
                .map(|p| words(p))
                .filter(|p| !p.is_empty() && rest.starts_with(p))
                .max_by_key(|p| p.len());
            match prefix {
                Some(prefix) => rest.drain(..prefix.len()).for_each(drop),
                None => break,
            }
        }
        rest.join(" ")
    }
}
