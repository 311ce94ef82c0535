//! Wake-phrase command state machine.
//!
//! Idle phrases are either exact direct-control phrases (executed at once)
//! or contain a wake token, which takes the priority lock and opens a
//! command window. Inside the window the owner's phrases are classified as
//! control actions or song requests. The window closes on a request, a
//! rejection, a disconnect, its own timeout, or lock expiry.
//!
//! Song requests are resolved on their own task; if that task panics the
//! window closes as failed and the loop keeps serving phrases.

use crate::audio::frame::SpeakerId;
use crate::clock::Clock;
use crate::defaults;
use crate::filter::{ContentFilter, Verdict};
use crate::media::jukebox::Jukebox;
use crate::pipeline::error::{ErrorReporter, LogReporter, TaskError};
use crate::pipeline::events::{ControlAction, EventSink, SessionEvent, WindowCloseReason};
use crate::session::context::SessionContext;
use crate::session::phrases::PhraseTables;
use crate::stt::arbiter::RecognizedPhrase;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// How often the run loop checks window and lock timeouts.
const TIMEOUT_POLL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    AwaitingCommand,
    /// A song request is being resolved.
    Processing,
}

/// Whether the dispatcher loop keeps running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub command_window: Duration,
    pub skip_cooldown: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            command_window: Duration::from_secs(defaults::COMMAND_WINDOW_SECS),
            skip_cooldown: Duration::from_millis(defaults::SKIP_COOLDOWN_MS),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    owner: SpeakerId,
    started: Instant,
}

async fn stopped(stop: &mut watch::Receiver<bool>) {
    // A dropped sender also ends the session.
    let _ = stop.wait_for(|s| *s).await;
}

pub struct CommandDispatcher {
    phrases: Arc<PhraseTables>,
    filter: Arc<ContentFilter>,
    jukebox: Arc<Jukebox>,
    context: Arc<SessionContext>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    reporter: Arc<dyn ErrorReporter>,
    config: DispatcherConfig,
    state: DispatchState,
    window: Option<Window>,
    last_skip: Option<Instant>,
    stop: Arc<watch::Sender<bool>>,
}

impl CommandDispatcher {
    pub fn new(
        phrases: Arc<PhraseTables>,
        filter: Arc<ContentFilter>,
        jukebox: Arc<Jukebox>,
        config: DispatcherConfig,
        events: Arc<dyn EventSink>,
        stop: Arc<watch::Sender<bool>>,
    ) -> Self {
        let context = Arc::clone(jukebox.context());
        let clock = Arc::clone(context.clock());
        Self {
            phrases,
            filter,
            jukebox,
            context,
            clock,
            events,
            reporter: Arc::new(LogReporter),
            config,
            state: DispatchState::Idle,
            window: None,
            last_skip: None,
            stop,
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Speaker that owns the open window.
    pub fn window_owner(&self) -> Option<SpeakerId> {
        self.window.map(|w| w.owner)
    }

    fn close_window(&mut self, reason: WindowCloseReason) {
        self.context.release_lock();
        if self.window.take().is_some() {
            tracing::debug!(?reason, "command window closed");
            self.events.emit(SessionEvent::WindowClosed { reason });
        }
        self.state = DispatchState::Idle;
    }

    /// Close the window if it timed out or its lock expired.
    pub fn check_timeout(&mut self) -> Option<WindowCloseReason> {
        let window = self.window?;
        if self.state != DispatchState::AwaitingCommand {
            return None;
        }
        let now = self.clock.now();
        let reason = if now.saturating_duration_since(window.started) >= self.config.command_window
        {
            WindowCloseReason::TimedOut
        } else if !self.context.is_lock_owner(window.owner) {
            WindowCloseReason::LockExpired
        } else {
            return None;
        };
        self.close_window(reason);
        Some(reason)
    }

    /// Handle one recognized phrase.
    pub async fn handle_phrase(&mut self, phrase: RecognizedPhrase) -> Flow {
        self.check_timeout();
        match self.state {
            DispatchState::Idle => self.handle_idle(phrase).await,
            DispatchState::AwaitingCommand => match self.window {
                Some(window) if window.owner == phrase.speaker => {
                    self.handle_command(phrase.speaker, &phrase.text).await
                }
                _ => {
                    tracing::debug!(speaker = phrase.speaker, "not the window owner, ignored");
                    Flow::Continue
                }
            },
            DispatchState::Processing => {
                tracing::debug!(speaker = phrase.speaker, "busy, ignored");
                Flow::Continue
            }
        }
    }

    async fn handle_idle(&mut self, phrase: RecognizedPhrase) -> Flow {
        if let Some(action) = self.phrases.direct_control(&phrase.text) {
            return self.control(action, phrase.speaker).await;
        }

        let Some(wake) = self.phrases.find_wake(&phrase.text) else {
            return Flow::Continue;
        };
        self.context.acquire_lock(phrase.speaker);
        self.window = Some(Window {
            owner: phrase.speaker,
            started: self.clock.now(),
        });
        self.state = DispatchState::AwaitingCommand;
        tracing::info!(speaker = phrase.speaker, token = %wake.token, "wake token heard");
        self.events.emit(SessionEvent::ListeningStarted {
            speaker: phrase.speaker,
        });

        match wake.trailing {
            Some(trailing) => self.handle_command(phrase.speaker, &trailing).await,
            None => Flow::Continue,
        }
    }

    async fn handle_command(&mut self, speaker: SpeakerId, text: &str) -> Flow {
        let request = self.phrases.strip_triggers(text);
        let action = self
            .phrases
            .window_control(text)
            .or_else(|| self.phrases.direct_control(text))
            .or_else(|| self.phrases.window_control(&request));
        if let Some(action) = action {
            return self.control(action, speaker).await;
        }

        if request.is_empty() {
            self.events.emit(SessionEvent::EmptyRequest { speaker });
            return Flow::Continue;
        }

        if let Verdict::Rejected(rejection) = self.filter.check(&request) {
            self.events.emit(SessionEvent::RequestRejected {
                query: request,
                reason: rejection.to_string(),
            });
            self.close_window(WindowCloseReason::Rejected);
            return Flow::Continue;
        }

        self.state = DispatchState::Processing;
        tracing::info!(speaker, query = %request, "song request");
        let jukebox = Arc::clone(&self.jukebox);
        let query = request.clone();
        let mut task = tokio::spawn(async move { jukebox.enqueue(&query).await });
        let mut stop = self.stop.subscribe();
        let outcome = tokio::select! {
            joined = &mut task => Some(joined),
            _ = stopped(&mut stop) => None,
        };
        match outcome {
            Some(Ok(result)) => {
                if let Err(e) = result {
                    tracing::debug!(query = %request, error = %e, "request finished without a track");
                }
                self.close_window(WindowCloseReason::Completed);
                Flow::Continue
            }
            Some(Err(e)) => {
                self.reporter.report(
                    "request",
                    &TaskError::Recoverable(format!("speaker {speaker}, '{request}': {e}")),
                );
                self.close_window(WindowCloseReason::Failed);
                Flow::Continue
            }
            None => {
                task.abort();
                self.close_window(WindowCloseReason::Disconnected);
                Flow::Stop
            }
        }
    }

    async fn control(&mut self, action: ControlAction, speaker: SpeakerId) -> Flow {
        match action {
            ControlAction::Disconnect => {
                let cleared = self.jukebox.disconnect();
                tracing::info!(speaker, cleared, "disconnect");
                self.events.emit(SessionEvent::Control { action, speaker });
                self.close_window(WindowCloseReason::Disconnected);
                self.stop.send_replace(true);
                return Flow::Stop;
            }
            ControlAction::Skip => {
                let now = self.clock.now();
                if self
                    .last_skip
                    .is_some_and(|at| now.saturating_duration_since(at) < self.config.skip_cooldown)
                {
                    tracing::debug!(speaker, "skip debounced");
                    return Flow::Continue;
                }
                self.last_skip = Some(now);
                self.events.emit(SessionEvent::Control { action, speaker });
                self.jukebox.skip().await;
                if let Some(window) = self.window.as_mut() {
                    window.started = now;
                }
            }
            ControlAction::NowPlaying => {
                self.events.emit(SessionEvent::Control { action, speaker });
                self.events.emit(SessionEvent::NowPlaying {
                    entry: self.jukebox.now_playing(),
                });
            }
        }
        Flow::Continue
    }

    /// Run until stopped, the phrase channel closes, or a disconnect.
    pub fn spawn(mut self, mut phrases: mpsc::Receiver<RecognizedPhrase>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut stop = self.stop.subscribe();
            let mut ticker = tokio::time::interval(TIMEOUT_POLL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = stopped(&mut stop) => break,
                    phrase = phrases.recv() => match phrase {
                        Some(phrase) => {
                            if self.handle_phrase(phrase).await == Flow::Stop {
                                break;
                            }
                        }
                        None => break,
                    },
                    _ = ticker.tick() => {
                        self.check_timeout();
                    }
                }
            }
            if self.window.is_some() {
                self.close_window(WindowCloseReason::Disconnected);
            }
            tracing::debug!("dispatcher stopped");
        })
    }
}
