//! Session engine orchestration.
//!
//! Two entry points: [`SessionEngine::on_message`] evaluates an inbound
//! message against the gate pipeline, and [`SessionEngine::directive_for`] is
//! the pre-generation hook that conditions replies on the active state.
//! Administrative operations live in the `admin` module as further `impl`
//! blocks on the engine.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tracing::{debug, info};

use mesmer_common::EngineConfig;

use crate::admin::ConfigPersister;
use crate::clock::{Clock, SystemClock};
use crate::cooldown::CooldownTracker;
use crate::directive::{Directive, DEFAULT_DIRECTIVE_TEMPLATE};
use crate::message::{IdentityKey, InboundMessage};
use crate::policy;
use crate::session::{SessionAttributes, SessionStore, StartOutcome};
use crate::trigger;

/// Result of evaluating one inbound message.
///
/// Every gate in the pipeline short-circuits to its own variant; only
/// [`Started`](Self::Started) created a session and charged the cooldown.
/// None of these is an error - denials are normal conversational noise the
/// host may ignore or answer with a minimal notice.
#[derive(Debug, Clone)]
pub enum TriggerOutcome {
    /// A session was started for the sender
    Started(crate::session::Session),
    /// The sender was already active; timer and cooldown untouched
    Continued(crate::session::Session),
    /// Engine is disabled
    Disabled,
    /// Authorization policy denied the sender
    Unauthorized,
    /// No keyword matched (or the bot was not mentioned)
    NoMatch,
    /// The sender is still inside the cooldown window
    CooldownActive {
        /// Time left before the gate reopens
        remaining: Duration,
    },
    /// The concurrent-session limit is reached
    CapacityExceeded,
}

/// Orchestrates trigger evaluation, session state, and the pre-generation
/// hook under one configuration snapshot.
///
/// Constructed once per process and shared behind an `Arc`; all operations
/// take `&self` and are safe to call from concurrent message-handling tasks.
pub struct SessionEngine {
    config: RwLock<Arc<EngineConfig>>,
    store: SessionStore,
    cooldowns: CooldownTracker,
    clock: Arc<dyn Clock>,
    persister: Option<Arc<dyn ConfigPersister>>,
}

impl SessionEngine {
    /// Create an engine over a resolved configuration snapshot.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config: RwLock::new(Arc::new(config)),
            store: SessionStore::new(),
            cooldowns: CooldownTracker::new(),
            clock: Arc::new(SystemClock),
            persister: None,
        }
    }

    /// Replace the time source (tests inject a manual clock).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Attach the host's configuration persistence collaborator.
    pub fn with_persister(mut self, persister: Arc<dyn ConfigPersister>) -> Self {
        self.persister = persister.into();
        self
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Arc<EngineConfig> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn swap_config(&self, next: EngineConfig) -> Arc<EngineConfig> {
        let mut guard = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(next);
        guard.clone()
    }

    // Clone-mutate-swap under the write lock so concurrent admin mutations
    // cannot lose each other's updates.
    pub(crate) fn update_config<F>(&self, mutate: F) -> Arc<EngineConfig>
    where
        F: FnOnce(&mut EngineConfig),
    {
        let mut guard = self.config.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = (**guard).clone();
        mutate(&mut next);
        *guard = Arc::new(next);
        guard.clone()
    }

    pub(crate) fn store(&self) -> &SessionStore {
        &self.store
    }

    pub(crate) fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    pub(crate) fn persister(&self) -> Option<&Arc<dyn ConfigPersister>> {
        self.persister.as_ref()
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        &*self.clock
    }

    /// Evaluate an inbound message.
    ///
    /// Gates run in a fixed order - enabled, authorized, keyword match,
    /// cooldown, capacity - and each one short-circuits to its own outcome.
    /// A sender who is already active gets [`TriggerOutcome::Continued`]
    /// before the cooldown gate, so re-triggering inside the window is a
    /// no-op rather than a denial.
    pub fn on_message(&self, msg: &InboundMessage) -> TriggerOutcome {
        let config = self.config();
        if !config.enabled {
            return TriggerOutcome::Disabled;
        }

        let identity = msg.identity_key();

        if !policy::is_authorized(&identity, msg.caller_is_admin, &config) {
            debug!(identity = %identity.masked(), "Trigger denied by policy");
            return TriggerOutcome::Unauthorized;
        }

        if !trigger::matches(&msg.text, msg.is_bot_mentioned, &config.trigger_keywords) {
            return TriggerOutcome::NoMatch;
        }

        let now = self.clock.now();

        if let Some(existing) = self.store.get(&identity, now) {
            debug!(identity = %identity.masked(), "Re-trigger while active, continuing");
            return TriggerOutcome::Continued(existing);
        }

        let cooldown = config.cooldown();
        if !self.cooldowns.try_acquire(&identity, now, cooldown) {
            let remaining = self.cooldowns.remaining(&identity, now, cooldown);
            debug!(
                identity = %identity.masked(),
                remaining_secs = remaining.as_secs(),
                "Trigger denied by cooldown"
            );
            return TriggerOutcome::CooldownActive { remaining };
        }

        let attributes = SessionAttributes {
            item_name: config.item_name.clone(),
            sensitivity: config.sensitivity,
        };

        match self
            .store
            .try_start(&identity, attributes, now, config.duration(), config.max_concurrent)
        {
            StartOutcome::Started(session) => {
                info!(
                    identity = %identity.masked(),
                    duration_secs = config.duration_seconds,
                    "Session started"
                );
                TriggerOutcome::Started(session)
            }
            StartOutcome::AlreadyActive(session) => {
                // Lost a same-identity race after the get above; not a new
                // start, so the cooldown charge is handed back.
                self.cooldowns.release(&identity);
                TriggerOutcome::Continued(session)
            }
            StartOutcome::RejectedFull => {
                // A denied message must not leave a cooldown entry behind.
                self.cooldowns.release(&identity);
                info!(
                    identity = %identity.masked(),
                    max_concurrent = config.max_concurrent,
                    "Trigger denied, session limit reached"
                );
                TriggerOutcome::CapacityExceeded
            }
        }
    }

    /// Pre-generation hook: contextual directive for an active sender.
    ///
    /// Returns `Some` only while an unexpired session exists for the
    /// identity; otherwise the generation step proceeds unmodified.
    pub fn directive_for(&self, identity: &IdentityKey) -> Option<Directive> {
        let now = self.clock.now();
        let session = self.store.get(identity, now)?;

        let config = self.config();
        let template = config
            .directive_template
            .as_deref()
            .unwrap_or(DEFAULT_DIRECTIVE_TEMPLATE);

        Some(Directive::render(template, &session.attributes))
    }

    /// Whether the identity currently has an unexpired session.
    pub fn is_active(&self, identity: &IdentityKey) -> bool {
        self.store.get(identity, self.clock.now()).is_some()
    }

    /// Spawn a periodic reclamation task for expired sessions and stale
    /// cooldown entries.
    ///
    /// Purely an optimization: correctness comes from lazy expiration on
    /// every read, this just bounds memory held for identities that never
    /// come back. Abort the returned handle to stop the task.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let now = engine.clock.now();
                let sessions = engine.store.sweep(now);
                let cooldowns = engine.cooldowns.sweep(now, engine.config().cooldown());
                if sessions > 0 || cooldowns > 0 {
                    debug!(sessions, cooldowns, "Background sweep reclaimed state");
                }
            }
        })
    }
}
