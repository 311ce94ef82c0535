//! Speech recognition provider seam and its in-memory stand-in.

use crate::audio::frame::MonoAudio;
use crate::error::{Result, VoiceDjError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Trait for speech recognition providers.
///
/// `Ok(None)` is the normal "no match" answer for unintelligible audio.
/// `Err` is a transient provider failure; callers treat it like `Ok(None)`.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Recognize mono PCM in the given BCP-47 language.
    async fn recognize(&self, audio: &MonoAudio, language: &str) -> Result<Option<String>>;

    /// Provider name for logs.
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: SpeechRecognizer + ?Sized> SpeechRecognizer for Arc<T> {
    async fn recognize(&self, audio: &MonoAudio, language: &str) -> Result<Option<String>> {
        (**self).recognize(audio, language).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[derive(Debug, Clone)]
enum MockAnswer {
    Text(String),
    NoMatch,
    Failure,
}

/// Mock recognizer answering per language.
///
/// Languages without a configured answer return no match.
#[derive(Debug, Clone, Default)]
pub struct MockRecognizer {
    answers: HashMap<String, MockAnswer>,
    delays: HashMap<String, Duration>,
    calls: Arc<AtomicUsize>,
    languages_seen: Arc<Mutex<Vec<String>>>,
}

impl MockRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `text` for `language`.
    pub fn with_response(mut self, language: &str, text: &str) -> Self {
        self.answers
            .insert(language.to_string(), MockAnswer::Text(text.to_string()));
        self
    }

    /// Answer "no match" for `language`.
    pub fn with_no_match(mut self, language: &str) -> Self {
        self.answers.insert(language.to_string(), MockAnswer::NoMatch);
        self
    }

    /// Fail with a provider error for `language`.
    pub fn with_failure(mut self, language: &str) -> Self {
        self.answers.insert(language.to_string(), MockAnswer::Failure);
        self
    }

    /// Sleep before answering for `language`.
    pub fn with_delay(mut self, language: &str, delay: Duration) -> Self {
        self.delays.insert(language.to_string(), delay);
        self
    }

    /// Number of recognize calls so far (shared across clones).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn languages_seen(&self) -> Vec<String> {
        self.languages_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SpeechRecognizer for MockRecognizer {
    async fn recognize(&self, _audio: &MonoAudio, language: &str) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.languages_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(language.to_string());

        if let Some(delay) = self.delays.get(language) {
            tokio::time::sleep(*delay).await;
        }

        match self.answers.get(language) {
            Some(MockAnswer::Text(text)) => Ok(Some(text.clone())),
            Some(MockAnswer::NoMatch) | None => Ok(None),
            Some(MockAnswer::Failure) => Err(VoiceDjError::Recognition {
                language: language.to_string(),
                message: "mock recognition failure".to_string(),
            }),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio() -> MonoAudio {
        MonoAudio {
            samples: vec![0; 16_000],
            sample_rate: 16_000,
        }
    }

    #[tokio::test]
    async fn test_mock_answers_per_language() {
        let recognizer = MockRecognizer::new()
            .with_response("vi-VN", "luna mở bài")
            .with_no_match("en-US");

        assert_eq!(
            recognizer.recognize(&audio(), "vi-VN").await.unwrap(),
            Some("luna mở bài".to_string())
        );
        assert_eq!(recognizer.recognize(&audio(), "en-US").await.unwrap(), None);
        assert_eq!(recognizer.recognize(&audio(), "fr-FR").await.unwrap(), None);
        assert_eq!(recognizer.calls(), 3);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let recognizer = MockRecognizer::new().with_failure("en-US");
        match recognizer.recognize(&audio(), "en-US").await {
            Err(VoiceDjError::Recognition { language, .. }) => assert_eq!(language, "en-US"),
            other => panic!("Expected Recognition error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_recognizer_trait_is_object_safe() {
        let recognizer: Arc<dyn SpeechRecognizer> =
            Arc::new(MockRecognizer::new().with_response("en-US", "boxed"));
        assert_eq!(recognizer.name(), "mock");
        assert_eq!(
            recognizer.recognize(&audio(), "en-US").await.unwrap(),
            Some("boxed".to_string())
        );
    }

    #[tokio::test]
    async fn test_clones_share_call_counter() {
        let recognizer = MockRecognizer::new();
        let clone = recognizer.clone();
        clone.recognize(&audio(), "vi-VN").await.unwrap();
        assert_eq!(recognizer.calls(), 1);
        assert_eq!(recognizer.languages_seen(), vec!["vi-VN".to_string()]);
    }
}
