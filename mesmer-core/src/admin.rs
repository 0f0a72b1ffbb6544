//! Administrative operations.
//!
//! Every operation here assumes the host has already validated the caller as
//! an administrator. Each returns a structured, serializable result for the
//! host to render; none of them can take the process down.

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use mesmer_common::{EngineConfig, Error, Result, Validate};

use crate::engine::SessionEngine;
use crate::message::IdentityKey;
use crate::session::Session;

/// External configuration collaborator.
///
/// The engine owns the in-memory snapshot but not its durable home;
/// authorized-set and enabled-flag mutations are handed to the host's config
/// layer through this seam.
#[async_trait]
pub trait ConfigPersister: Send + Sync {
    /// Persist the given snapshot.
    async fn persist(&self, snapshot: &EngineConfig) -> anyhow::Result<()>;
}

/// One active session as shown to administrators.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    /// Masked identity key (raw keys stay out of admin output and logs)
    pub identity: String,
    /// Seconds until expiry
    pub remaining_secs: u64,
    /// Item label captured at start
    pub item_name: String,
    /// Sensitivity captured at start
    pub sensitivity: u8,
}

impl SessionSummary {
    fn from_session(session: &Session, now: std::time::Instant) -> Self {
        Self {
            identity: session.identity_key.masked(),
            remaining_secs: session.remaining(now).as_secs(),
            item_name: session.attributes.item_name.clone(),
            sensitivity: session.attributes.sensitivity,
        }
    }
}

/// Engine status snapshot for the `status` command.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub enabled: bool,
    pub admin_only: bool,
    pub active_sessions: usize,
    pub max_concurrent: usize,
    pub duration_seconds: u64,
    pub cooldown_seconds: u64,
    pub sensitivity: u8,
    pub sessions: Vec<SessionSummary>,
}

/// Result of a clear operation.
#[derive(Debug, Clone, Serialize)]
pub struct ClearReport {
    /// Sessions removed (cooldown entries are wiped alongside)
    pub cleared: usize,
}

/// Result of an enable/disable flip.
#[derive(Debug, Clone, Serialize)]
pub struct EnableReport {
    /// State after the operation
    pub enabled: bool,
    /// Sessions cleared by a disable, zero otherwise
    pub cleared: usize,
}

/// Authorized-user list after a mutation.
#[derive(Debug, Clone, Serialize)]
pub struct UserListReport {
    pub users: Vec<String>,
    /// Whether the operation changed the list
    pub changed: bool,
}

/// Static engine metadata for the `info` command.
#[derive(Debug, Clone, Serialize)]
pub struct EngineInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
}

impl SessionEngine {
    /// Current status and the active session list, oldest first.
    pub fn status(&self) -> StatusReport {
        let config = self.config();
        let now = self.clock().now();
        let sessions: Vec<SessionSummary> = self
            .store()
            .list_active(now)
            .iter()
            .map(|session| SessionSummary::from_session(session, now))
            .collect();

        StatusReport {
            enabled: config.enabled,
            admin_only: config.admin_only,
            active_sessions: sessions.len(),
            max_concurrent: config.max_concurrent,
            duration_seconds: config.duration_seconds,
            cooldown_seconds: config.cooldown_seconds,
            sensitivity: config.sensitivity,
            sessions,
        }
    }

    /// Remove every session and cooldown entry.
    pub fn clear(&self) -> ClearReport {
        let cleared = self.store().clear_all();
        self.cooldowns().clear_all();
        info!(cleared, "Cleared all sessions and cooldowns");
        ClearReport { cleared }
    }

    /// Remove one identity's session.
    ///
    /// An absent or already-expired session is a reported no-op
    /// ([`Error::NotFound`]), never fatal.
    pub fn clear_session(&self, identity: &IdentityKey) -> Result<SessionSummary> {
        let now = self.clock().now();
        match self.store().remove(identity, now) {
            Some(session) => {
                info!(identity = %identity.masked(), "Session cleared");
                Ok(SessionSummary::from_session(&session, now))
            }
            None => Err(Error::NotFound(format!(
                "no active session for {}",
                identity.masked()
            ))),
        }
    }

    /// Adopt a new configuration snapshot.
    ///
    /// The snapshot is validated first; on failure the previously active one
    /// stays in place untouched and the error is returned to the caller.
    /// In-flight sessions keep the attributes they captured at start time.
    pub fn reload(&self, snapshot: EngineConfig) -> Result<()> {
        snapshot.validate()?;
        self.swap_config(snapshot);
        info!("Configuration reloaded");
        Ok(())
    }

    /// Flip the enabled flag. Disabling also clears every active session
    /// and cooldown entry.
    pub async fn set_enabled(&self, enabled: bool) -> Result<EnableReport> {
        let next = self.update_config(|config| config.enabled = enabled);

        let cleared = if enabled {
            0
        } else {
            let report = self.clear();
            report.cleared
        };

        info!(enabled, cleared, "Engine enabled flag changed");
        self.persist_snapshot(&next).await?;
        Ok(EnableReport { enabled, cleared })
    }

    /// Add an identity to the authorized set.
    ///
    /// Adding an already-present identity is a no-op that skips persistence.
    pub async fn add_user(&self, identity: &str) -> Result<UserListReport> {
        let mut changed = false;
        let next = self.update_config(|config| {
            if !config.is_authorized_user(identity) {
                config.authorized_users.push(identity.to_string());
                changed = true;
            }
        });

        if !changed {
            return Ok(UserListReport {
                users: next.authorized_users.clone(),
                changed: false,
            });
        }

        info!(identity = %IdentityKey::from_raw(identity).masked(), "Authorized user added");
        self.persist_snapshot(&next).await?;
        Ok(UserListReport {
            users: next.authorized_users.clone(),
            changed: true,
        })
    }

    /// Remove an identity from the authorized set.
    ///
    /// Removing an absent identity is a reported no-op ([`Error::NotFound`]).
    pub async fn remove_user(&self, identity: &str) -> Result<UserListReport> {
        let mut changed = false;
        let next = self.update_config(|config| {
            let before = config.authorized_users.len();
            config.authorized_users.retain(|u| u != identity);
            changed = config.authorized_users.len() != before;
        });

        if !changed {
            return Err(Error::NotFound(format!(
                "{} is not in the authorized set",
                IdentityKey::from_raw(identity).masked()
            )));
        }

        info!(identity = %IdentityKey::from_raw(identity).masked(), "Authorized user removed");
        self.persist_snapshot(&next).await?;
        Ok(UserListReport {
            users: next.authorized_users.clone(),
            changed: true,
        })
    }

    /// Current authorized-user list.
    pub fn list_users(&self) -> Vec<String> {
        self.config().authorized_users.clone()
    }

    /// Static engine metadata; touches no session state.
    pub fn info(&self) -> EngineInfo {
        EngineInfo {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            description: env!("CARGO_PKG_DESCRIPTION"),
        }
    }

    async fn persist_snapshot(&self, snapshot: &EngineConfig) -> Result<()> {
        if let Some(persister) = self.persister() {
            persister
                .persist(snapshot)
                .await
                .map_err(|e| Error::Persist(e.to_string()))?;
        }
        Ok(())
    }
}
