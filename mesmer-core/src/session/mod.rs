//! Session lifecycle: records and the store that owns them.
//!
//! A session is one identity's time-boxed active state. It is created by the
//! engine on a successful trigger, read-only for its life, and removed
//! lazily once expired, by an admin clear, or when the engine is disabled.

mod store;

pub use store::SessionStore;

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::message::IdentityKey;

/// Attributes captured from configuration when a session starts.
///
/// Immutable for the session's life: a later configuration reload does not
/// retroactively alter in-flight sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionAttributes {
    /// Label of the item the session attributes to the persona
    pub item_name: String,
    /// Sensitivity level 0-100
    pub sensitivity: u8,
}

/// One identity's active interactive state.
#[derive(Debug, Clone)]
pub struct Session {
    /// Identity this session belongs to
    pub identity_key: IdentityKey,
    /// When the session started
    pub started_at: Instant,
    /// When the session lapses; always after `started_at`
    pub expires_at: Instant,
    /// Attributes captured at start time
    pub attributes: SessionAttributes,
}

impl Session {
    /// Whether the session has lapsed at `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Time left before expiry, zero once lapsed.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}

/// Outcome of a start attempt against the store.
#[derive(Debug, Clone)]
pub enum StartOutcome {
    /// A new session was created
    Started(Session),
    /// An unexpired session already existed; its timer is untouched
    AlreadyActive(Session),
    /// The concurrent-session limit is reached
    RejectedFull,
}
