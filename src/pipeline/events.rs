//! Outbound session events.
//!
//! The surrounding chat layer renders these as user-visible messages.

use crate::audio::frame::SpeakerId;
use crate::media::queue::QueueEntry;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

/// Direct control actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Disconnect,
    Skip,
    NowPlaying,
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlAction::Disconnect => write!(f, "disconnect"),
            ControlAction::Skip => write!(f, "skip"),
            ControlAction::NowPlaying => write!(f, "now-playing"),
        }
    }
}

/// Why a command window closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowCloseReason {
    /// A song request was accepted and handed off.
    Completed,
    /// The content filter rejected the request.
    Rejected,
    TimedOut,
    LockExpired,
    Disconnected,
    /// Handling the request crashed.
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Arbiter forwarded a phrase to the dispatcher.
    PhraseRecognized {
        speaker: SpeakerId,
        text: String,
        language: String,
    },
    /// A wake token opened a command window.
    ListeningStarted { speaker: SpeakerId },
    WindowClosed { reason: WindowCloseReason },
    Control {
        action: ControlAction,
        speaker: SpeakerId,
    },
    /// Request was empty after stripping trigger words; window stays open.
    EmptyRequest { speaker: SpeakerId },
    RequestRejected { query: String, reason: String },
    /// Metadata service suggested an exact title.
    MetadataGuess { title: String },
    TrackEnqueued { entry: QueueEntry, position: usize },
    PlaylistImported { playlist: String, count: usize },
    TrackStarted { entry: QueueEntry },
    NowPlaying { entry: Option<QueueEntry> },
    ResolutionFailed { query: String },
    /// Queue drained after the last track finished.
    QueueFinished,
}

/// Receiver of session events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SessionEvent);
}

impl EventSink for mpsc::UnboundedSender<SessionEvent> {
    fn emit(&self, event: SessionEvent) {
        if self.send(event).is_err() {
            tracing::trace!("event receiver dropped");
        }
    }
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn emit(&self, event: SessionEvent) {
        (**self).emit(event)
    }
}

/// Sink that records events, for tests.
#[derive(Debug, Clone, Default)]
pub struct CollectorEventSink {
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl CollectorEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<SessionEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn count(&self, pred: impl Fn(&SessionEvent) -> bool) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| pred(e))
            .count()
    }
}

impl EventSink for CollectorEventSink {
    fn emit(&self, event: SessionEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Sink that logs every event at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&self, event: SessionEvent) {
        match &event {
            SessionEvent::PhraseRecognized {
                speaker,
                text,
                language,
            } => tracing::info!(speaker, language = %language, "heard: {text}"),
            SessionEvent::ListeningStarted { speaker } => {
                tracing::info!(speaker, "listening for a command")
            }
            SessionEvent::WindowClosed { reason } => tracing::info!(?reason, "command window closed"),
            SessionEvent::Control { action, speaker } => tracing::info!(speaker, %action, "control"),
            SessionEvent::EmptyRequest { speaker } => tracing::info!(speaker, "empty request"),
            SessionEvent::RequestRejected { query, reason } => {
                tracing::info!(query = %query, "rejected: {reason}")
            }
            SessionEvent::MetadataGuess { title } => tracing::info!("metadata guess: {title}"),
            SessionEvent::TrackEnqueued { entry, position } => {
                tracing::info!(position, "queued: {}", entry.title)
            }
            SessionEvent::PlaylistImported { playlist, count } => {
                tracing::info!(count, playlist = %playlist, "playlist imported")
            }
            SessionEvent::TrackStarted { entry } => tracing::info!("now playing: {}", entry.title),
            SessionEvent::NowPlaying { entry } => match entry {
                Some(entry) => tracing::info!("current track: {}", entry.title),
                None => tracing::info!("nothing playing"),
            },
            SessionEvent::ResolutionFailed { query } => {
                tracing::warn!(query = %query, "no playable result")
            }
            SessionEvent::QueueFinished => tracing::info!("queue finished"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_records_in_order() {
        let sink = CollectorEventSink::new();
        sink.emit(SessionEvent::ListeningStarted { speaker: 1 });
        sink.emit(SessionEvent::WindowClosed {
            reason: WindowCloseReason::TimedOut,
        });
        assert_eq!(sink.events().len(), 2);
        assert_eq!(
            sink.count(|e| matches!(e, SessionEvent::WindowClosed { .. })),
            1
        );
        assert_eq!(sink.take().len(), 2);
        assert!(sink.events().is_empty());
    }

    #[tokio::test]
    async fn channel_sink_forwards() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.emit(SessionEvent::QueueFinished);
        assert_eq!(rx.recv().await, Some(SessionEvent::QueueFinished));
    }

    #[test]
    fn channel_sink_ignores_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel::<SessionEvent>();
        drop(rx);
        tx.emit(SessionEvent::QueueFinished);
    }

    #[test]
    fn control_action_display() {
        assert_eq!(ControlAction::NowPlaying.to_string(), "now-playing");
    }
}
