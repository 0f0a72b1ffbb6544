//! In-memory session store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use super::{Session, SessionAttributes, StartOutcome};
use crate::message::IdentityKey;

/// Thread-safe mapping from identity key to session record.
///
/// The store is the sole mutator of session state. A single mutex guards the
/// whole map: every critical section is a short in-memory scan, and the
/// coarse lock is what makes `try_start`'s sweep-count-insert sequence and
/// `clear_all` linearizable with respect to each other.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<IdentityKey, Session>>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    // Critical sections never unwind mid-mutation, so a poisoned lock still
    // guards a consistent map; recover the guard instead of propagating.
    fn lock(&self) -> MutexGuard<'_, HashMap<IdentityKey, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sweep_locked(sessions: &mut HashMap<IdentityKey, Session>, now: Instant) -> usize {
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now));
        before - sessions.len()
    }

    /// Attempt to start a session for `identity`.
    ///
    /// An unexpired session for the same identity is an idempotent continue:
    /// the existing record is returned and its timer is not reset. Otherwise
    /// the capacity check runs against the swept (truthful) count before the
    /// insert.
    pub fn try_start(
        &self,
        identity: &IdentityKey,
        attributes: SessionAttributes,
        now: Instant,
        duration: Duration,
        max_concurrent: usize,
    ) -> StartOutcome {
        let mut sessions = self.lock();
        Self::sweep_locked(&mut sessions, now);

        if let Some(existing) = sessions.get(identity) {
            return StartOutcome::AlreadyActive(existing.clone());
        }

        if sessions.len() >= max_concurrent {
            return StartOutcome::RejectedFull;
        }

        let session = Session {
            identity_key: identity.clone(),
            started_at: now,
            expires_at: now + duration,
            attributes,
        };
        sessions.insert(identity.clone(), session.clone());
        StartOutcome::Started(session)
    }

    /// Return the unexpired session for `identity`, evicting it if lapsed.
    ///
    /// Eviction is observable only as absence, never as an error.
    pub fn get(&self, identity: &IdentityKey, now: Instant) -> Option<Session> {
        let mut sessions = self.lock();
        match sessions.get(identity) {
            Some(session) if session.is_expired(now) => {
                sessions.remove(identity);
                None
            }
            Some(session) => Some(session.clone()),
            None => None,
        }
    }

    /// Remove one identity's session, returning it if it was still active.
    pub fn remove(&self, identity: &IdentityKey, now: Instant) -> Option<Session> {
        let mut sessions = self.lock();
        sessions
            .remove(identity)
            .filter(|session| !session.is_expired(now))
    }

    /// Remove every session, returning how many were removed.
    pub fn clear_all(&self) -> usize {
        let mut sessions = self.lock();
        let count = sessions.len();
        sessions.clear();
        count
    }

    /// Unexpired sessions sorted by start time, oldest first.
    pub fn list_active(&self, now: Instant) -> Vec<Session> {
        let mut sessions = self.lock();
        Self::sweep_locked(&mut sessions, now);
        let mut active: Vec<Session> = sessions.values().cloned().collect();
        active.sort_by_key(|session| session.started_at);
        active
    }

    /// Number of unexpired sessions.
    pub fn active_count(&self, now: Instant) -> usize {
        let mut sessions = self.lock();
        Self::sweep_locked(&mut sessions, now);
        sessions.len()
    }

    /// Evict every expired session; returns how many were reclaimed.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut sessions = self.lock();
        let removed = Self::sweep_locked(&mut sessions, now);
        if removed > 0 {
            debug!(removed, "Swept expired sessions");
        }
        removed
    }
}
