//! One running voice session.
//!
//! ```text
//! frames → AudioIngestBuffer ─scan─▶ SilenceSegmenter ─utterance─▶ TranscriptionArbiter
//!                                                                     │ phrases (bounded, ordered)
//!                                  Jukebox ◀── enqueue ── CommandDispatcher
//!                                     ▲
//!                                     └── TrackFinished (continuation)
//! ```
//!
//! Three tasks run until the session stops: the silence scan, the dispatcher
//! loop and the playback continuation loop. A disconnect, by voice or through
//! the handle, stops all three.

use crate::audio::frame::FrameConsumer;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{Result, VoiceDjError};
use crate::filter::{ContentFilter, Verdict};
use crate::ingest::{AudioIngestBuffer, SilenceSegmenter, SpeakerGate};
use crate::media::{
    Jukebox, MediaSearch, MetadataSearch, PlaybackSink, PlaylistExpander, QueueEntry,
    TrackResolver,
};
use crate::pipeline::error::{ErrorReporter, LogReporter};
use crate::pipeline::events::{EventSink, SessionEvent};
use crate::session::{CommandDispatcher, PhraseTables, SessionContext, SessionSnapshot};
use crate::stt::{SpeechRecognizer, TranscriptionArbiter};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// External collaborators of a session.
pub struct Providers {
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub search: Arc<dyn MediaSearch>,
    pub metadata: Option<Arc<dyn MetadataSearch>>,
    pub playlists: Option<Arc<dyn PlaylistExpander>>,
    pub sink: Arc<dyn PlaybackSink>,
    pub clock: Arc<dyn Clock>,
    pub reporter: Arc<dyn ErrorReporter>,
}

impl Providers {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        search: Arc<dyn MediaSearch>,
        sink: Arc<dyn PlaybackSink>,
    ) -> Self {
        Self {
            recognizer,
            search,
            metadata: None,
            playlists: None,
            sink,
            clock: Arc::new(SystemClock),
            reporter: Arc::new(LogReporter),
        }
    }

    pub fn with_metadata(mut self, metadata: Arc<dyn MetadataSearch>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_playlists(mut self, playlists: Arc<dyn PlaylistExpander>) -> Self {
        self.playlists = Some(playlists);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }
}

pub struct VoiceSession;

impl VoiceSession {
    /// Validate `config`, wire every stage and spawn the session tasks.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        config: &Config,
        providers: Providers,
        events: Arc<dyn EventSink>,
    ) -> Result<VoiceSessionHandle> {
        config.validate()?;
        let Providers {
            recognizer,
            search,
            metadata,
            playlists,
            sink,
            clock,
            reporter,
        } = providers;

        let context = Arc::new(SessionContext::new(config.lock_ttl(), Arc::clone(&clock)));
        let gate: Arc<dyn SpeakerGate> = context.clone();
        let buffer = Arc::new(AudioIngestBuffer::new(config.ingest(), gate, clock));
        let phrases = Arc::new(config.phrase_tables());
        let filter = Arc::new(config.content_filter());

        let (stop, _) = watch::channel(false);
        let stop = Arc::new(stop);

        let (phrase_tx, phrase_rx) = mpsc::channel(config.recognition.delivery_capacity);
        let arbiter = TranscriptionArbiter::new(
            recognizer,
            config.arbiter(),
            Arc::clone(&phrases),
            Arc::clone(&context),
            phrase_tx,
            Arc::clone(&events),
        )
        .with_reporter(Arc::clone(&reporter));
        let segmenter = SilenceSegmenter::new(Arc::clone(&buffer), Arc::new(arbiter))
            .with_interval(config.scan_interval())
            .with_reporter(Arc::clone(&reporter));

        let mut resolver = TrackResolver::new(
            search,
            Arc::new(config.query_corrector()),
            config.resolver(),
            Arc::clone(&events),
        );
        if let Some(metadata) = metadata {
            resolver = resolver.with_metadata(metadata);
        }
        let (mut jukebox, finished_rx) = Jukebox::new(
            Arc::clone(&context),
            Arc::new(resolver),
            sink,
            Arc::clone(&events),
        );
        if let Some(playlists) = playlists {
            jukebox = jukebox.with_playlists(playlists);
        }
        let jukebox = Arc::new(jukebox.with_reporter(Arc::clone(&reporter)));

        let dispatcher = CommandDispatcher::new(
            Arc::clone(&phrases),
            Arc::clone(&filter),
            Arc::clone(&jukebox),
            config.dispatcher(),
            Arc::clone(&events),
            Arc::clone(&stop),
        )
        .with_reporter(reporter);

        let tasks = vec![
            segmenter.spawn(stop.subscribe()),
            dispatcher.spawn(phrase_rx),
            Arc::clone(&jukebox).spawn_continuation(finished_rx, stop.subscribe()),
        ];
        tracing::info!(
            primary = %config.recognition.primary_language,
            secondary = %config.recognition.secondary_language,
            "voice session started"
        );

        Ok(VoiceSessionHandle {
            buffer,
            jukebox,
            filter,
            phrases,
            events,
            stop,
            tasks,
        })
    }
}

/// Control surface of a running session.
pub struct VoiceSessionHandle {
    buffer: Arc<AudioIngestBuffer>,
    jukebox: Arc<Jukebox>,
    filter: Arc<ContentFilter>,
    phrases: Arc<PhraseTables>,
    events: Arc<dyn EventSink>,
    stop: Arc<watch::Sender<bool>>,
    tasks: Vec<JoinHandle<()>>,
}

impl VoiceSessionHandle {
    /// Where the voice transport delivers tagged frames.
    pub fn frame_consumer(&self) -> Arc<dyn FrameConsumer> {
        self.buffer.clone()
    }

    /// Text-command path: filter and enqueue a request without a wake token.
    pub async fn play_text(&self, query: &str) -> Result<usize> {
        let request = self.phrases.strip_triggers(query);
        if let Verdict::Rejected(rejection) = self.filter.check(&request) {
            let reason = rejection.to_string();
            self.events.emit(SessionEvent::RequestRejected {
                query: request.clone(),
                reason: reason.clone(),
            });
            return Err(VoiceDjError::Rejected {
                query: request,
                reason,
            });
        }
        self.jukebox.enqueue(&request).await
    }

    pub async fn import_playlist(&self, playlist_ref: &str) -> Result<usize> {
        self.jukebox.import_playlist(playlist_ref).await
    }

    /// Stop the current track and start the next one.
    pub async fn skip(&self) -> Option<QueueEntry> {
        self.jukebox.skip().await
    }

    pub fn pause(&self) -> bool {
        self.jukebox.pause()
    }

    pub fn resume(&self) -> bool {
        self.jukebox.resume()
    }

    pub fn now_playing(&self) -> Option<QueueEntry> {
        self.jukebox.now_playing()
    }

    /// Titles waiting to play, current entry excluded.
    pub fn queue_listing(&self) -> Vec<String> {
        self.jukebox.queue_listing()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.jukebox.context().snapshot()
    }

    pub fn is_running(&self) -> bool {
        !*self.stop.borrow()
    }

    /// Clear the queue, release the lock and stop every session task.
    pub fn disconnect(&self) -> usize {
        let cleared = self.jukebox.disconnect();
        self.stop.send_replace(true);
        cleared
    }

    /// Stop the session tasks and wait for them.
    pub async fn shutdown(self) {
        self.stop.send_replace(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::warn!("session task ended abnormally: {e}");
            }
        }
        self.buffer.reset();
        tracing::info!("voice session stopped");
    }
}
