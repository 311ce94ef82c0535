//! Per-session shared state: priority lock, playback queue, connection.
//!
//! Lock, queue and playback status share one mutex so a disconnect is a
//! single critical section. No caller can observe the queue cleared while
//! the lock is still held, or the reverse.

use crate::audio::frame::SpeakerId;
use crate::clock::Clock;
use crate::error::{Result, VoiceDjError};
use crate::ingest::buffer::SpeakerGate;
use crate::media::queue::{PlaybackQueue, QueueEntry};
use crate::session::lock::PriorityLock;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// What the playback side is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Idle,
    /// Resolving the next lazy entry.
    Resolving,
    Playing,
    Paused,
}

/// Consistent view of the session at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub connected: bool,
    pub lock_owner: Option<SpeakerId>,
    pub queued: usize,
    pub current: Option<QueueEntry>,
    pub status: PlaybackStatus,
}

#[derive(Debug)]
struct Shared {
    lock: PriorityLock,
    queue: PlaybackQueue,
    connected: bool,
    status: PlaybackStatus,
    generation: u64,
}

pub struct SessionContext {
    shared: Mutex<Shared>,
    clock: Arc<dyn Clock>,
}

impl SessionContext {
    pub fn new(lock_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            shared: Mutex::new(Shared {
                lock: PriorityLock::new(lock_ttl),
                queue: PlaybackQueue::new(),
                connected: true,
                status: PlaybackStatus::Idle,
                generation: 0,
            }),
            clock,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn state(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // --- priority lock ---

    pub fn acquire_lock(&self, speaker: SpeakerId) {
        let now = self.clock.now();
        self.state().lock.acquire(speaker, now);
    }

    pub fn release_lock(&self) {
        self.state().lock.release();
    }

    pub fn is_locked(&self) -> bool {
        let now = self.clock.now();
        self.state().lock.is_locked(now)
    }

    pub fn lock_owner(&self) -> Option<SpeakerId> {
        let now = self.clock.now();
        self.state().lock.owner(now)
    }

    pub fn is_lock_owner(&self, speaker: SpeakerId) -> bool {
        self.lock_owner() == Some(speaker)
    }

    // --- queue ---

    /// Append one entry; returns its 1-based position.
    pub fn enqueue(&self, entry: QueueEntry) -> Result<usize> {
        let mut state = self.state();
        if !state.connected {
            return Err(VoiceDjError::Disconnected);
        }
        Ok(state.queue.push(entry))
    }

    /// Append entries in order; returns how many were added.
    pub fn enqueue_all(&self, entries: Vec<QueueEntry>) -> Result<usize> {
        let mut state = self.state();
        if !state.connected {
            return Err(VoiceDjError::Disconnected);
        }
        let count = entries.len();
        for entry in entries {
            state.queue.push(entry);
        }
        Ok(count)
    }

    pub fn queue_titles(&self) -> Vec<String> {
        self.state().queue.titles()
    }

    pub fn queue_len(&self) -> usize {
        self.state().queue.len()
    }

    pub fn now_playing(&self) -> Option<QueueEntry> {
        self.state().queue.current().cloned()
    }

    /// Drop waiting entries. The current track keeps playing.
    pub fn clear_queue(&self) -> usize {
        let mut state = self.state();
        let waiting = state.queue.len();
        while state.queue.pop_front().is_some() {}
        waiting
    }

    // --- playback status ---

    pub fn playback_status(&self) -> PlaybackStatus {
        self.state().status
    }

    pub fn generation(&self) -> u64 {
        self.state().generation
    }

    /// Pop the next entry if nothing is playing, resolving or paused.
    ///
    /// Marks the session as resolving and returns the entry with the
    /// generation the playback must carry.
    pub fn begin_next(&self) -> Option<(QueueEntry, u64)> {
        let mut state = self.state();
        if !state.connected || state.status != PlaybackStatus::Idle {
            return None;
        }
        let entry = state.queue.pop_front()?;
        state.generation += 1;
        state.status = PlaybackStatus::Resolving;
        Some((entry, state.generation))
    }

    /// Install `entry` as current if `generation` is still live.
    pub fn mark_playing(&self, entry: QueueEntry, generation: u64) -> bool {
        let mut state = self.state();
        if !state.connected || state.generation != generation {
            return false;
        }
        state.queue.set_current(entry);
        state.status = PlaybackStatus::Playing;
        true
    }

    /// Return to idle after a resolution for `generation` gave up.
    pub fn abandon(&self, generation: u64) -> bool {
        let mut state = self.state();
        if state.generation != generation || state.status != PlaybackStatus::Resolving {
            return false;
        }
        state.status = PlaybackStatus::Idle;
        true
    }

    /// Playback for `generation` ended. Stale generations are ignored.
    pub fn finish(&self, generation: u64) -> bool {
        let mut state = self.state();
        if state.generation != generation || state.status == PlaybackStatus::Idle {
            return false;
        }
        state.queue.take_current();
        state.status = PlaybackStatus::Idle;
        true
    }

    /// Stop whatever is current; invalidates its pending completion.
    /// Returns the stopped entry.
    pub fn stop_current(&self) -> Option<QueueEntry> {
        let mut state = self.state();
        state.generation += 1;
        state.status = PlaybackStatus::Idle;
        state.queue.take_current()
    }

    pub fn set_paused(&self, paused: bool) -> bool {
        let mut state = self.state();
        match (state.status, paused) {
            (PlaybackStatus::Playing, true) => {
                state.status = PlaybackStatus::Paused;
                true
            }
            (PlaybackStatus::Paused, false) => {
                state.status = PlaybackStatus::Playing;
                true
            }
            _ => false,
        }
    }

    // --- connection ---

    pub fn is_connected(&self) -> bool {
        self.state().connected
    }

    /// Clear the queue and current slot, release the lock, invalidate any
    /// in-flight playback, and mark the session disconnected. Returns the
    /// number of waiting entries dropped.
    pub fn disconnect(&self) -> usize {
        let mut state = self.state();
        let cleared = state.queue.clear();
        state.lock.release();
        state.generation += 1;
        state.status = PlaybackStatus::Idle;
        state.connected = false;
        cleared
    }

    /// Accept work again after a disconnect.
    pub fn reconnect(&self) {
        self.state().connected = true;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let now = self.clock.now();
        let mut state = self.state();
        SessionSnapshot {
            connected: state.connected,
            lock_owner: state.lock.owner(now),
            queued: state.queue.len(),
            current: state.queue.current().cloned(),
            status: state.status,
        }
    }
}

impl SpeakerGate for SessionContext {
    fn is_allowed(&self, speaker: SpeakerId) -> bool {
        let now = self.clock.now();
        self.state().lock.is_allowed(speaker, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::media::provider::TrackSummary;

    fn context() -> (SessionContext, ManualClock) {
        let clock = ManualClock::new();
        let ctx = SessionContext::new(Duration::from_secs(15), Arc::new(clock.clone()));
        (ctx, clock)
    }

    fn entry(title: &str) -> QueueEntry {
        QueueEntry::lazy(&TrackSummary::new(title, "artist"))
    }

    #[test]
    fn gate_follows_lock() {
        let (ctx, clock) = context();
        assert!(ctx.is_allowed(1));
        ctx.acquire_lock(1);
        assert!(ctx.is_allowed(1));
        assert!(!ctx.is_allowed(2));

        clock.advance_ms(15_100);
        assert!(ctx.is_allowed(2));
        assert_eq!(ctx.lock_owner(), None);
    }

    #[test]
    fn disconnect_is_atomic() {
        let (ctx, _clock) = context();
        ctx.acquire_lock(1);
        ctx.enqueue(entry("a")).unwrap();
        ctx.enqueue(entry("b")).unwrap();
        let (first, generation) = ctx.begin_next().unwrap();
        assert!(ctx.mark_playing(first, generation));

        assert_eq!(ctx.disconnect(), 1);
        let snap = ctx.snapshot();
        assert_eq!(snap.queued, 0);
        assert_eq!(snap.lock_owner, None);
        assert_eq!(snap.current, None);
        assert!(!snap.connected);
        assert!(!ctx.finish(generation), "completion after disconnect is stale");
    }

    #[test]
    fn enqueue_refused_after_disconnect() {
        let (ctx, _clock) = context();
        ctx.disconnect();
        assert!(matches!(ctx.enqueue(entry("late")), Err(VoiceDjError::Disconnected)));
        ctx.reconnect();
        assert_eq!(ctx.enqueue(entry("again")).unwrap(), 1);
    }

    #[test]
    fn begin_next_is_noop_while_busy() {
        let (ctx, _clock) = context();
        ctx.enqueue(entry("a")).unwrap();
        ctx.enqueue(entry("b")).unwrap();
        let (_, generation) = ctx.begin_next().unwrap();
        assert!(ctx.begin_next().is_none(), "resolving");
        assert!(ctx.mark_playing(entry("a"), generation));
        assert!(ctx.begin_next().is_none(), "playing");
        assert!(ctx.set_paused(true));
        assert!(ctx.begin_next().is_none(), "paused");
        assert_eq!(ctx.queue_len(), 1);
    }

    #[test]
    fn stop_invalidates_pending_completion() {
        let (ctx, _clock) = context();
        ctx.enqueue(entry("a")).unwrap();
        let (first, generation) = ctx.begin_next().unwrap();
        ctx.mark_playing(first, generation);

        assert_eq!(ctx.stop_current().unwrap().title, "a");
        assert!(!ctx.finish(generation));
        assert_eq!(ctx.playback_status(), PlaybackStatus::Idle);
    }

    #[test]
    fn finish_clears_current() {
        let (ctx, _clock) = context();
        ctx.enqueue(entry("a")).unwrap();
        let (first, generation) = ctx.begin_next().unwrap();
        ctx.mark_playing(first, generation);
        assert!(ctx.finish(generation));
        assert!(ctx.now_playing().is_none());
        assert!(!ctx.finish(generation), "completion is consumed once");
    }

    #[test]
    fn abandon_only_applies_while_resolving() {
        let (ctx, _clock) = context();
        ctx.enqueue(entry("a")).unwrap();
        let (_, generation) = ctx.begin_next().unwrap();
        assert!(ctx.abandon(generation));
        assert!(!ctx.abandon(generation));
    }
}
