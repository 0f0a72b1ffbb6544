//! Mesmer Core - per-identity control-session engine for chat pipelines.
//!
//! Decides, for each inbound message, whether a triggering phrase starts a
//! time-boxed interactive mode for the sending identity, tracks which
//! identities are currently active, enforces cooldown and concurrency
//! limits, and hands the downstream text-generation step a small advisory
//! directive while a session is active.
//!
//! ## Architecture
//!
//! ```text
//! inbound message → policy + matcher + cooldown → engine decision
//!                                                       ↓
//!                                               session store (create/refuse)
//!                                                       ↓
//! pre-generation hook ← active session? ← any later message from the identity
//!         ↓
//!     directive → generation backend
//! ```
//!
//! Expiration is lazy: a session is gone once `now >= expires_at`, detected
//! on every read. An optional background sweep reclaims memory but is never
//! needed for correctness.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod admin;
pub mod clock;
pub mod cooldown;
pub mod directive;
pub mod engine;
pub mod message;
pub mod policy;
pub mod session;
pub mod trigger;

// Re-export commonly used types
pub use admin::{
    ClearReport, ConfigPersister, EnableReport, EngineInfo, SessionSummary, StatusReport,
    UserListReport,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use cooldown::CooldownTracker;
pub use directive::{Directive, DEFAULT_DIRECTIVE_TEMPLATE};
pub use engine::{SessionEngine, TriggerOutcome};
pub use message::{IdentityKey, InboundMessage};
pub use mesmer_common::{EngineConfig, Error, Result};
pub use session::{Session, SessionAttributes, SessionStore, StartOutcome};
