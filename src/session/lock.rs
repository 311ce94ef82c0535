//! Single-speaker priority lock with lazy TTL expiry.

use crate::audio::frame::SpeakerId;
use std::time::{Duration, Instant};

/// Time-bounded exclusivity claim for one speaker.
///
/// There is no timer: expiry is detected when the lock is read, and the read
/// performs the release.
#[derive(Debug, Clone)]
pub struct PriorityLock {
    owner: Option<SpeakerId>,
    acquired_at: Option<Instant>,
    ttl: Duration,
}

impl PriorityLock {
    pub fn new(ttl: Duration) -> Self {
        Self {
            owner: None,
            acquired_at: None,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Take the lock for `speaker`. The last acquirer wins.
    pub fn acquire(&mut self, speaker: SpeakerId, now: Instant) {
        self.owner = Some(speaker);
        self.acquired_at = Some(now);
    }

    pub fn release(&mut self) {
        self.owner = None;
        self.acquired_at = None;
    }

    /// Whether a live owner exists. Releases the lock if its TTL has passed.
    pub fn is_locked(&mut self, now: Instant) -> bool {
        match (self.owner, self.acquired_at) {
            (Some(_), Some(at)) if now.saturating_duration_since(at) > self.ttl => {
                tracing::debug!(owner = ?self.owner, "priority lock expired");
                self.release();
                false
            }
            (Some(_), Some(_)) => true,
            _ => false,
        }
    }

    /// Unlocked admits everyone; locked admits only the owner.
    pub fn is_allowed(&mut self, speaker: SpeakerId, now: Instant) -> bool {
        !self.is_locked(now) || self.owner == Some(speaker)
    }

    /// Current live owner.
    pub fn owner(&mut self, now: Instant) -> Option<SpeakerId> {
        if self.is_locked(now) { self.owner } else { None }
    }

    pub fn acquired_at(&self) -> Option<Instant> {
        self.acquired_at
    }
}

impl Default for PriorityLock {
    fn default() -> Self {
        Self::new(Duration::from_secs(crate::defaults::LOCK_TTL_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlocked_admits_everyone() {
        let mut lock = PriorityLock::default();
        let now = Instant::now();
        assert!(!lock.is_locked(now));
        assert!(lock.is_allowed(1, now));
        assert_eq!(lock.owner(now), None);
    }

    #[test]
    fn locked_admits_only_owner() {
        let mut lock = PriorityLock::default();
        let now = Instant::now();
        lock.acquire(1, now);
        assert!(lock.is_locked(now));
        assert!(lock.is_allowed(1, now));
        assert!(!lock.is_allowed(2, now));
    }

    #[test]
    fn last_acquirer_wins() {
        let mut lock = PriorityLock::default();
        let now = Instant::now();
        lock.acquire(1, now);
        lock.acquire(2, now + Duration::from_secs(1));
        assert_eq!(lock.owner(now + Duration::from_secs(1)), Some(2));
    }

    #[test]
    fn expires_lazily_after_ttl() {
        let mut lock = PriorityLock::new(Duration::from_secs(15));
        let t0 = Instant::now();
        lock.acquire(1, t0);

        assert!(lock.is_locked(t0 + Duration::from_secs(15)), "boundary is inclusive");
        assert!(!lock.is_locked(t0 + Duration::from_millis(15_100)));
        // Expiry released the owner for good
        assert!(!lock.is_locked(t0));
        assert_eq!(lock.acquired_at(), None);
    }

    #[test]
    fn release_clears_owner() {
        let mut lock = PriorityLock::default();
        let now = Instant::now();
        lock.acquire(5, now);
        lock.release();
        assert!(!lock.is_locked(now));
        assert!(lock.is_allowed(6, now));
    }
}
