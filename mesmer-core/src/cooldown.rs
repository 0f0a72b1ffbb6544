//! Per-identity cooldown gate.
//!
//! Tracks the last successful trigger per identity and refuses re-triggers
//! inside the configured window. The check-and-record step runs under a
//! per-key entry guard so two concurrent messages from the same identity
//! cannot both pass the gate.

use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::message::IdentityKey;

/// Last-trigger timestamps keyed by identity.
#[derive(Debug, Default)]
pub struct CooldownTracker {
    last_trigger: DashMap<IdentityKey, Instant>,
}

impl CooldownTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self {
            last_trigger: DashMap::new(),
        }
    }

    /// Check the gate and, if it passes, record `now` as the new last-trigger
    /// time in the same critical section.
    ///
    /// Passes when no entry exists or the existing one has aged past
    /// `cooldown`. A failed check leaves the entry untouched.
    pub fn try_acquire(&self, identity: &IdentityKey, now: Instant, cooldown: Duration) -> bool {
        match self.last_trigger.entry(identity.clone()) {
            Entry::Occupied(mut entry) => {
                if now.saturating_duration_since(*entry.get()) >= cooldown {
                    entry.insert(now);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                true
            }
        }
    }

    /// Drop an entry written by a `try_acquire` whose trigger was then
    /// refused downstream.
    ///
    /// The acquire only passed because the previous entry was absent or
    /// already stale, so removing leaves the gate in an equivalent state: the
    /// identity's next attempt is not charged for a trigger that never
    /// happened.
    pub fn release(&self, identity: &IdentityKey) {
        self.last_trigger.remove(identity);
    }

    /// Time left inside the window, `Duration::ZERO` when the gate is open.
    pub fn remaining(&self, identity: &IdentityKey, now: Instant, cooldown: Duration) -> Duration {
        match self.last_trigger.get(identity) {
            Some(last) => cooldown.saturating_sub(now.saturating_duration_since(*last)),
            None => Duration::ZERO,
        }
    }

    /// Remove every entry.
    pub fn clear_all(&self) {
        self.last_trigger.clear();
    }

    /// Drop entries that have aged past the window; returns how many were
    /// removed. Staleness is otherwise computed lazily, so this exists purely
    /// to reclaim memory from one-off identities.
    pub fn sweep(&self, now: Instant, cooldown: Duration) -> usize {
        let before = self.last_trigger.len();
        self.last_trigger
            .retain(|_, last| now.saturating_duration_since(*last) < cooldown);
        before - self.last_trigger.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> IdentityKey {
        IdentityKey::new("guild-1", "alice")
    }

    #[test]
    fn test_first_acquire_passes_and_records() {
        let tracker = CooldownTracker::new();
        let now = Instant::now();
        let window = Duration::from_secs(30);

        assert!(tracker.try_acquire(&identity(), now, window));
        assert!(!tracker.try_acquire(&identity(), now + Duration::from_secs(10), window));
    }

    #[test]
    fn test_acquire_passes_after_window() {
        let tracker = CooldownTracker::new();
        let now = Instant::now();
        let window = Duration::from_secs(30);

        assert!(tracker.try_acquire(&identity(), now, window));
        assert!(tracker.try_acquire(&identity(), now + Duration::from_secs(30), window));
    }

    #[test]
    fn test_failed_acquire_leaves_entry_untouched() {
        let tracker = CooldownTracker::new();
        let now = Instant::now();
        let window = Duration::from_secs(30);

        assert!(tracker.try_acquire(&identity(), now, window));
        // Denied attempt at t=20 must not push the window out to t=50
        assert!(!tracker.try_acquire(&identity(), now + Duration::from_secs(20), window));
        assert!(tracker.try_acquire(&identity(), now + Duration::from_secs(30), window));
    }

    #[test]
    fn test_zero_cooldown_always_passes() {
        let tracker = CooldownTracker::new();
        let now = Instant::now();

        assert!(tracker.try_acquire(&identity(), now, Duration::ZERO));
        assert!(tracker.try_acquire(&identity(), now, Duration::ZERO));
    }

    #[test]
    fn test_release_reopens_gate() {
        let tracker = CooldownTracker::new();
        let now = Instant::now();
        let window = Duration::from_secs(30);

        assert!(tracker.try_acquire(&identity(), now, window));
        tracker.release(&identity());
        assert!(tracker.try_acquire(&identity(), now + Duration::from_secs(1), window));
    }

    #[test]
    fn test_remaining() {
        let tracker = CooldownTracker::new();
        let now = Instant::now();
        let window = Duration::from_secs(30);

        assert_eq!(tracker.remaining(&identity(), now, window), Duration::ZERO);
        tracker.try_acquire(&identity(), now, window);
        assert_eq!(
            tracker.remaining(&identity(), now + Duration::from_secs(10), window),
            Duration::from_secs(20)
        );
        assert_eq!(
            tracker.remaining(&identity(), now + Duration::from_secs(40), window),
            Duration::ZERO
        );
    }

    #[test]
    fn test_identities_are_independent() {
        let tracker = CooldownTracker::new();
        let now = Instant::now();
        let window = Duration::from_secs(30);

        assert!(tracker.try_acquire(&IdentityKey::new("g", "a"), now, window));
        assert!(tracker.try_acquire(&IdentityKey::new("g", "b"), now, window));
    }

    #[test]
    fn test_sweep_drops_only_stale_entries() {
        let tracker = CooldownTracker::new();
        let now = Instant::now();
        let window = Duration::from_secs(30);

        tracker.try_acquire(&IdentityKey::new("g", "old"), now, window);
        tracker.try_acquire(&IdentityKey::new("g", "fresh"), now + Duration::from_secs(25), window);

        let removed = tracker.sweep(now + Duration::from_secs(40), window);
        assert_eq!(removed, 1);
        assert!(!tracker.try_acquire(
            &IdentityKey::new("g", "fresh"),
            now + Duration::from_secs(40),
            window
        ));
    }

    #[test]
    fn test_concurrent_acquire_single_winner() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Barrier;

        let tracker = CooldownTracker::new();
        let now = Instant::now();
        let window = Duration::from_secs(30);
        let barrier = Barrier::new(8);
        let passed = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    barrier.wait();
                    if tracker.try_acquire(&identity(), now, window) {
                        passed.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(passed.load(Ordering::SeqCst), 1);
    }
}
