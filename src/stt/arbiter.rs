//! Dual-language recognition race, winner selection and de-duplication.
//!
//! Both recognizers run concurrently on the same utterance, so latency is
//! bounded by the slower call. Provider errors count as "no match" for that
//! language only.

use crate::audio::frame::{MonoAudio, SpeakerId};
use crate::clock::Clock;
use crate::defaults;
use crate::ingest::buffer::Utterance;
use crate::ingest::segmenter::UtteranceHandler;
use crate::pipeline::error::{ErrorReporter, LogReporter, TaskError};
use crate::pipeline::events::{EventSink, SessionEvent};
use crate::session::context::SessionContext;
use crate::session::phrases::{PhraseTables, contains_phrase, normalize};
use crate::stt::recognizer::SpeechRecognizer;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// One recognizer's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptCandidate {
    pub language: String,
    pub text: Option<String>,
}

impl TranscriptCandidate {
    pub fn new(language: &str, text: Option<&str>) -> Self {
        Self {
            language: language.to_string(),
            text: text.map(normalize).filter(|t| !t.is_empty()),
        }
    }
}

/// The arbiter's output, delivered to the dispatcher in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizedPhrase {
    pub text: String,
    pub speaker: SpeakerId,
    pub language: String,
    pub timestamp: Instant,
}

#[derive(Debug, Clone)]
pub struct ArbiterConfig {
    pub primary_language: String,
    pub secondary_language: String,
    /// Secondary wins when its length is at least this share of the primary's.
    pub secondary_length_ratio: f32,
    pub duplicate_window: Duration,
    /// Tokens that make the primary transcript win outright.
    pub control_tokens: Vec<String>,
    /// Forward only phrases with a wake/direct phrase, or from the lock owner.
    pub require_wake_token: bool,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            primary_language: defaults::PRIMARY_LANGUAGE.to_string(),
            secondary_language: defaults::SECONDARY_LANGUAGE.to_string(),
            secondary_length_ratio: defaults::SECONDARY_LENGTH_RATIO,
            duplicate_window: Duration::from_millis(defaults::DUPLICATE_WINDOW_MS),
            control_tokens: defaults::CONTROL_TOKENS.iter().map(|s| s.to_string()).collect(),
            require_wake_token: true,
        }
    }
}

/// Pick at most one transcript out of the two.
///
/// Primary wins if it contains a control token. Otherwise secondary wins when
/// it is not much shorter than primary. A lone answer wins by default.
pub fn select_transcript(
    primary: &TranscriptCandidate,
    secondary: &TranscriptCandidate,
    control_tokens: &[String],
    secondary_length_ratio: f32,
) -> Option<TranscriptCandidate> {
    match (&primary.text, &secondary.text) {
        (Some(p), Some(s)) => {
            if control_tokens.iter().any(|t| contains_phrase(p, &normalize(t))) {
                return Some(primary.clone());
            }
            let p_len = p.chars().count() as f32;
            let s_len = s.chars().count() as f32;
            if s_len >= p_len * secondary_length_ratio {
                Some(secondary.clone())
            } else {
                Some(primary.clone())
            }
        }
        (Some(_), None) => Some(primary.clone()),
        (None, Some(_)) => Some(secondary.clone()),
        (None, None) => None,
    }
}

pub struct TranscriptionArbiter {
    recognizer: Arc<dyn SpeechRecognizer>,
    config: ArbiterConfig,
    control_tokens: Vec<String>,
    phrases: Arc<PhraseTables>,
    context: Arc<SessionContext>,
    clock: Arc<dyn Clock>,
    last_emitted: Mutex<Option<(String, Instant)>>,
    delivery: mpsc::Sender<RecognizedPhrase>,
    events: Arc<dyn EventSink>,
    reporter: Arc<dyn ErrorReporter>,
}

impl TranscriptionArbiter {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        config: ArbiterConfig,
        phrases: Arc<PhraseTables>,
        context: Arc<SessionContext>,
        delivery: mpsc::Sender<RecognizedPhrase>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        // Wake tokens always count as control tokens.
        let mut control_tokens = config.control_tokens.clone();
        control_tokens.extend(phrases.wake_tokens().iter().cloned());
        let clock = Arc::clone(context.clock());
        Self {
            recognizer,
            config,
            control_tokens,
            phrases,
            context,
            clock,
            last_emitted: Mutex::new(None),
            delivery,
            events,
            reporter: Arc::new(LogReporter),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    async fn recognize_one(&self, audio: &MonoAudio, language: &str) -> TranscriptCandidate {
        match self.recognizer.recognize(audio, language).await {
            Ok(text) => TranscriptCandidate::new(language, text.as_deref()),
            Err(e) => {
                tracing::debug!(language, "recognition failed: {e}");
                TranscriptCandidate::new(language, None)
            }
        }
    }

    /// Race both languages and pick a transcript.
    pub async fn transcribe(&self, audio: &MonoAudio) -> Option<TranscriptCandidate> {
        let (primary, secondary) = tokio::join!(
            self.recognize_one(audio, &self.config.primary_language),
            self.recognize_one(audio, &self.config.secondary_language),
        );
        select_transcript(
            &primary,
            &secondary,
            &self.control_tokens,
            self.config.secondary_length_ratio,
        )
    }

    /// Apply the relevance gate and duplicate suppression to a selected
    /// transcript. Returns the phrase to deliver, if any.
    pub fn admit(&self, speaker: SpeakerId, candidate: TranscriptCandidate) -> Option<RecognizedPhrase> {
        let text = candidate.text?;

        if self.config.require_wake_token
            && !self.phrases.is_relevant(&text)
            && !self.context.is_lock_owner(speaker)
        {
            tracing::debug!(speaker, "ignored (no wake token): {text}");
            return None;
        }

        let now = self.clock.now();
        let mut last = self.last_emitted.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((prev, at)) = last.as_ref()
            && *prev == text
            && now.saturating_duration_since(*at) < self.config.duplicate_window
        {
            tracing::debug!(speaker, "duplicate suppressed: {text}");
            return None;
        }
        *last = Some((text.clone(), now));

        Some(RecognizedPhrase {
            text,
            speaker,
            language: candidate.language,
            timestamp: now,
        })
    }

    /// Full path for one utterance: downmix, race, select, admit, deliver.
    pub async fn process(&self, utterance: Utterance) -> Option<RecognizedPhrase> {
        let speaker = utterance.speaker;
        let audio = match utterance.to_mono() {
            Ok(audio) => audio,
            Err(e) => {
                self.reporter
                    .report("arbiter", &TaskError::Recoverable(e.to_string()));
                return None;
            }
        };

        let candidate = self.transcribe(&audio).await?;
        let phrase = self.admit(speaker, candidate)?;

        tracing::info!(speaker, language = %phrase.language, "recognized: {}", phrase.text);
        self.events.emit(SessionEvent::PhraseRecognized {
            speaker,
            text: phrase.text.clone(),
            language: phrase.language.clone(),
        });
        if self.delivery.send(phrase.clone()).await.is_err() {
            tracing::debug!("dispatcher gone, dropping phrase");
        }
        Some(phrase)
    }
}

#[async_trait]
impl UtteranceHandler for TranscriptionArbiter {
    async fn handle(&self, utterance: Utterance) {
        self.process(utterance).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::frame::AudioFormat;
    use crate::clock::ManualClock;
    use crate::pipeline::events::CollectorEventSink;
    use crate::stt::recognizer::MockRecognizer;

    fn candidate(lang: &str, text: Option<&str>) -> TranscriptCandidate {
        TranscriptCandidate::new(lang, text)
    }

    fn tokens() -> Vec<String> {
        defaults::CONTROL_TOKENS.iter().map(|s| s.to_string()).collect()
    }

    fn utterance(speaker: SpeakerId) -> Utterance {
        Utterance::new(
            speaker,
            vec![1000; 96_000],
            AudioFormat {
                sample_rate: 48_000,
                channels: 2,
            },
            Instant::now(),
        )
    }

    struct Harness {
        arbiter: TranscriptionArbiter,
        rx: mpsc::Receiver<RecognizedPhrase>,
        clock: ManualClock,
        context: Arc<SessionContext>,
    }

    fn harness(recognizer: MockRecognizer) -> Harness {
        let clock = ManualClock::new();
        let context = Arc::new(SessionContext::new(
            Duration::from_secs(15),
            Arc::new(clock.clone()),
        ));
        let (tx, rx) = mpsc::channel(8);
        let arbiter = TranscriptionArbiter::new(
            Arc::new(recognizer),
            ArbiterConfig::default(),
            Arc::new(PhraseTables::default()),
            context.clone(),
            tx,
            Arc::new(CollectorEventSink::new()),
        );
        Harness {
            arbiter,
            rx,
            clock,
            context,
        }
    }

    #[test]
    fn primary_wins_with_control_token() {
        let picked = select_transcript(
            &candidate("vi-VN", Some("luna chuyển bài")),
            &candidate("en-US", Some("luna trance by the way")),
            &tokens(),
            0.7,
        )
        .unwrap();
        assert_eq!(picked.language, "vi-VN");
    }

    #[test]
    fn secondary_wins_when_long_enough() {
        let picked = select_transcript(
            &candidate("vi-VN", Some("sếp áp du")),
            &candidate("en-US", Some("shape of you")),
            &tokens(),
            0.7,
        )
        .unwrap();
        assert_eq!(picked.text.as_deref(), Some("shape of you"));
    }

    #[test]
    fn primary_wins_when_secondary_too_short() {
        let picked = select_transcript(
            &candidate("vi-VN", Some("em của ngày hôm qua")),
            &candidate("en-US", Some("m")),
            &tokens(),
            0.7,
        )
        .unwrap();
        assert_eq!(picked.language, "vi-VN");
    }

    #[test]
    fn lone_answer_wins_and_none_yields_nothing() {
        let only_secondary =
            select_transcript(&candidate("vi-VN", None), &candidate("en-US", Some("hello")), &tokens(), 0.7);
        assert_eq!(only_secondary.unwrap().language, "en-US");
        assert!(
            select_transcript(&candidate("vi-VN", None), &candidate("en-US", Some("  ")), &tokens(), 0.7)
                .is_none()
        );
    }

    #[tokio::test]
    async fn provider_failure_degrades_to_other_language() {
        let mut h = harness(
            MockRecognizer::new()
                .with_failure("vi-VN")
                .with_response("en-US", "Luna play despacito"),
        );
        let phrase = h.arbiter.process(utterance(1)).await.unwrap();
        assert_eq!(phrase.text, "luna play despacito");
        assert_eq!(h.rx.recv().await.unwrap().language, "en-US");
    }

    #[tokio::test]
    async fn irrelevant_phrase_is_not_delivered() {
        let mut h = harness(MockRecognizer::new().with_response("vi-VN", "ăn cơm chưa"));
        assert!(h.arbiter.process(utterance(1)).await.is_none());
        assert!(h.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn lock_owner_bypasses_wake_requirement() {
        let mut h = harness(MockRecognizer::new().with_response("vi-VN", "lạc trôi"));
        h.context.acquire_lock(4);
        assert!(h.arbiter.process(utterance(4)).await.is_some());
        assert_eq!(h.rx.recv().await.unwrap().text, "lạc trôi");
    }

    #[tokio::test]
    async fn duplicates_within_window_are_suppressed() {
        let mut h = harness(MockRecognizer::new().with_response("vi-VN", "luna skip"));
        assert!(h.arbiter.process(utterance(1)).await.is_some());
        h.clock.advance_ms(4000);
        assert!(h.arbiter.process(utterance(2)).await.is_none());
        h.clock.advance_ms(1500);
        assert!(h.arbiter.process(utterance(1)).await.is_some());

        assert!(h.rx.recv().await.is_some());
        assert!(h.rx.recv().await.is_some());
        assert!(h.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn both_languages_are_queried() {
        let recognizer = MockRecognizer::new();
        let h = harness(recognizer.clone());
        assert!(h.arbiter.process(utterance(1)).await.is_none());
        let mut seen = recognizer.languages_seen();
        seen.sort();
        assert_eq!(seen, vec!["en-US", "vi-VN"]);
    }

    #[tokio::test(start_paused = true)]
    async fn recognition_runs_in_parallel() {
        let recognizer = MockRecognizer::new()
            .with_response("vi-VN", "luna")
            .with_delay("vi-VN", Duration::from_secs(3))
            .with_delay("en-US", Duration::from_secs(3));
        let h = harness(recognizer);
        let start = tokio::time::Instant::now();
        h.arbiter.process(utterance(1)).await;
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
