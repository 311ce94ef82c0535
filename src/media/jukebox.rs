//! Drives the playback queue against a [`PlaybackSink`].
//!
//! Starting playback pops the next entry, resolves it if lazy, and hands the
//! stream to the sink with a one-shot completion. Completions come back over
//! a channel and trigger the next entry; completions from a stopped or
//! disconnected generation are ignored.
//!
//! Provider calls run isolated: a panicking search, resolver or sink fails
//! that one call, is reported, and the queue moves on.

use crate::error::{Result, VoiceDjError};
use crate::media::provider::{PlaybackCompletion, PlaybackSink, PlaylistExpander, TrackFinished};
use crate::media::queue::QueueEntry;
use crate::media::resolver::TrackResolver;
use crate::pipeline::error::{ErrorReporter, LogReporter, TaskError};
use crate::pipeline::events::{EventSink, SessionEvent};
use crate::session::context::SessionContext;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

pub struct Jukebox {
    context: Arc<SessionContext>,
    resolver: Arc<TrackResolver>,
    playlists: Option<Arc<dyn PlaylistExpander>>,
    sink: Arc<dyn PlaybackSink>,
    events: Arc<dyn EventSink>,
    reporter: Arc<dyn ErrorReporter>,
    finished_tx: mpsc::UnboundedSender<TrackFinished>,
}

/// Turn a crashed task into an error after reporting it.
fn task_failure(
    reporter: &dyn ErrorReporter,
    task: &str,
    message: impl Into<String>,
) -> VoiceDjError {
    let message = message.into();
    reporter.report(task, &TaskError::Recoverable(message.clone()));
    VoiceDjError::TaskFailed {
        task: task.to_string(),
        message,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panicked".to_string())
}

impl Jukebox {
    /// Build a jukebox and the receiver its continuation loop must drain.
    pub fn new(
        context: Arc<SessionContext>,
        resolver: Arc<TrackResolver>,
        sink: Arc<dyn PlaybackSink>,
        events: Arc<dyn EventSink>,
    ) -> (Self, mpsc::UnboundedReceiver<TrackFinished>) {
        let (finished_tx, finished_rx) = mpsc::unbounded_channel();
        let jukebox = Self {
            context,
            resolver,
            playlists: None,
            sink,
            events,
            reporter: Arc::new(LogReporter),
            finished_tx,
        };
        (jukebox, finished_rx)
    }

    pub fn with_playlists(mut self, playlists: Arc<dyn PlaylistExpander>) -> Self {
        self.playlists = Some(playlists);
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    /// Run a provider call on its own task.
    async fn isolated<T, F>(&self, task: &str, call: F) -> Result<T>
    where
        T: Send + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        match tokio::spawn(call).await {
            Ok(result) => result,
            Err(e) => Err(task_failure(self.reporter.as_ref(), task, e.to_string())),
        }
    }

    /// Resolve `raw_query` and append it. Returns the 1-based queue position.
    pub async fn enqueue(&self, raw_query: &str) -> Result<usize> {
        let resolver = Arc::clone(&self.resolver);
        let query = raw_query.to_string();
        let resolved = self
            .isolated("resolution", async move { resolver.resolve_query(&query).await })
            .await;
        let stream = match resolved {
            Ok(stream) => stream,
            Err(e) => {
                tracing::info!(query = raw_query, error = %e, "request not resolved");
                self.events.emit(SessionEvent::ResolutionFailed {
                    query: raw_query.to_string(),
                });
                return Err(e);
            }
        };
        let entry = QueueEntry::from_stream(stream);
        let position = self.context.enqueue(entry.clone())?;
        self.events
            .emit(SessionEvent::TrackEnqueued { entry, position });
        self.start_playback().await;
        Ok(position)
    }

    /// Expand a playlist into lazy entries. Returns how many were queued.
    pub async fn import_playlist(&self, playlist_ref: &str) -> Result<usize> {
        let expander = self
            .playlists
            .as_ref()
            .ok_or_else(|| VoiceDjError::PlaylistExpansion {
                playlist: playlist_ref.to_string(),
                message: "no playlist provider configured".to_string(),
            })?;
        let tracks = expander.expand(playlist_ref).await?;
        if tracks.is_empty() {
            return Err(VoiceDjError::PlaylistExpansion {
                playlist: playlist_ref.to_string(),
                message: "playlist is empty".to_string(),
            });
        }
        let entries: Vec<QueueEntry> = tracks.iter().map(QueueEntry::lazy).collect();
        let count = self.context.enqueue_all(entries)?;
        tracing::info!(playlist = playlist_ref, count, "playlist imported");
        self.events.emit(SessionEvent::PlaylistImported {
            playlist: playlist_ref.to_string(),
            count,
        });
        self.start_playback().await;
        Ok(count)
    }

    /// Play the next entry unless something is already playing, resolving
    /// or paused. Entries that fail to resolve or start are dropped and the
    /// following entry is tried.
    pub async fn start_playback(&self) {
        while let Some((mut entry, generation)) = self.context.begin_next() {
            if let Some(locator) = entry.locator() {
                let resolver = Arc::clone(&self.resolver);
                let resolved = self
                    .isolated("resolution", async move {
                        resolver.resolve_deferred(&locator).await
                    })
                    .await;
                match resolved {
                    Ok(stream) => entry.mark_resolved(stream),
                    Err(e) => {
                        tracing::warn!(title = %entry.title, error = %e, "lazy entry failed, skipping");
                        self.events.emit(SessionEvent::ResolutionFailed {
                            query: entry.title.clone(),
                        });
                        if self.context.abandon(generation) {
                            continue;
                        }
                        return;
                    }
                }
            }

            let Some(stream_ref) = entry.stream_ref.clone() else {
                if self.context.abandon(generation) {
                    continue;
                }
                return;
            };

            // Stopped or disconnected while resolving.
            if !self.context.mark_playing(entry.clone(), generation) {
                return;
            }

            let completion = PlaybackCompletion::new(self.finished_tx.clone(), generation);
            // No await between marking and playing: a disconnect cannot slip in.
            let started = catch_unwind(AssertUnwindSafe(|| self.sink.play(&stream_ref, completion)))
                .unwrap_or_else(|payload| {
                    Err(task_failure(
                        self.reporter.as_ref(),
                        "playback",
                        panic_message(&*payload),
                    ))
                });
            match started {
                Ok(()) => {
                    tracing::info!(title = %entry.title, "now playing");
                    self.events.emit(SessionEvent::TrackStarted { entry });
                    return;
                }
                Err(e) => {
                    tracing::warn!(title = %entry.title, error = %e, "sink refused track");
                    self.events.emit(SessionEvent::ResolutionFailed {
                        query: entry.title.clone(),
                    });
                    if !self.context.finish(generation) {
                        return;
                    }
                }
            }
        }
    }

    /// Stop the current track and move on. Returns the stopped entry.
    pub async fn skip(&self) -> Option<QueueEntry> {
        let stopped = self.context.stop_current();
        self.sink.stop();
        self.start_playback().await;
        stopped
    }

    pub fn pause(&self) -> bool {
        let paused = self.context.set_paused(true);
        if paused {
            self.sink.pause();
        }
        paused
    }

    pub fn resume(&self) -> bool {
        let resumed = self.context.set_paused(false);
        if resumed {
            self.sink.resume();
        }
        resumed
    }

    pub fn now_playing(&self) -> Option<QueueEntry> {
        self.context.now_playing()
    }

    /// Titles waiting to play, current entry excluded.
    pub fn queue_listing(&self) -> Vec<String> {
        self.context.queue_titles()
    }

    /// Drop waiting entries; the current track keeps playing.
    pub fn clear(&self) -> usize {
        self.context.clear_queue()
    }

    /// Clear everything, release the lock and stop the sink.
    pub fn disconnect(&self) -> usize {
        let cleared = self.context.disconnect();
        self.sink.stop();
        cleared
    }

    /// Handle one completion signal.
    pub async fn on_finished(&self, finished: TrackFinished) {
        if !self.context.finish(finished.generation) {
            tracing::trace!(generation = finished.generation, "stale completion");
            return;
        }
        if self.context.queue_len() == 0 {
            self.events.emit(SessionEvent::QueueFinished);
            return;
        }
        self.start_playback().await;
    }

    /// Run the continuation loop until shutdown.
    pub fn spawn_continuation(
        self: Arc<Self>,
        mut finished_rx: mpsc::UnboundedReceiver<TrackFinished>,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.changed() => {
                        if *shutdown.borrow() {
                            break;
                        }
                    }
                    finished = finished_rx.recv() => match finished {
                        Some(finished) => {
                            let jukebox = Arc::clone(&self);
                            let step = tokio::spawn(async move { jukebox.on_finished(finished).await });
                            if let Err(e) = step.await {
                                self.reporter.report(
                                    "continuation",
                                    &TaskError::Recoverable(e.to_string()),
                                );
                            }
                        }
                        None => break,
                    },
                }
            }
            tracing::debug!("playback continuation stopped");
        })
    }
}
