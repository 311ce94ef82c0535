//! Periodic silence scan that turns buffered audio into utterances.

use crate::ingest::buffer::{AudioIngestBuffer, Utterance};
use crate::pipeline::error::{ErrorReporter, LogReporter, TaskError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Receives each segmented utterance.
#[async_trait]
pub trait UtteranceHandler: Send + Sync {
    async fn handle(&self, utterance: Utterance);
}

/// Drives [`AudioIngestBuffer::scan`] on a fixed interval.
///
/// Every flushed utterance is handled on its own task; the speaker's pending
/// mark is cleared when that task ends, including when it panics.
pub struct SilenceSegmenter {
    buffer: Arc<AudioIngestBuffer>,
    handler: Arc<dyn UtteranceHandler>,
    reporter: Arc<dyn ErrorReporter>,
    interval: Duration,
}

impl SilenceSegmenter {
    pub fn new(buffer: Arc<AudioIngestBuffer>, handler: Arc<dyn UtteranceHandler>) -> Self {
        Self {
            buffer,
            handler,
            reporter: Arc::new(LogReporter),
            interval: Duration::from_millis(crate::defaults::SCAN_INTERVAL_MS),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Run one scan and dispatch whatever it flushed.
    pub fn tick(&self) -> Vec<JoinHandle<()>> {
        let report = self.buffer.scan();
        if report.cleared_locked > 0 {
            tracing::debug!(
                cleared = report.cleared_locked,
                "cleared buffers of locked-out speakers"
            );
        }

        report
            .flushed
            .into_iter()
            .map(|utterance| {
                let buffer = Arc::clone(&self.buffer);
                let handler = Arc::clone(&self.handler);
                let reporter = Arc::clone(&self.reporter);
                let speaker = utterance.speaker;
                tracing::debug!(speaker, duration_ms = utterance.duration_ms(), "utterance flushed");

                tokio::spawn(async move {
                    let outcome =
                        tokio::spawn(async move { handler.handle(utterance).await }).await;
                    if let Err(e) = outcome {
                        reporter.report(
                            "recognition",
                            &TaskError::Recoverable(format!("speaker {speaker}: {e}")),
                        );
                    }
                    buffer.complete(speaker);
                })
            })
            .collect()
    }

    /// Scan until `shutdown` flips to true or its sender is dropped.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.tick();
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("segmenter stopped");
        })
    }
}
