//! Inbound message model and identity keys.

use std::fmt;

use sha2::{Digest, Sha256};

/// Composite key scoping a user within a chat context.
///
/// All session and cooldown state is partitioned by this key, so the same
/// user in two chat scopes is two independent identities. Log output must use
/// [`masked`](Self::masked), never the raw key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Build a key from the host-provided chat scope and user ids.
    pub fn new(chat_scope_id: &str, user_id: &str) -> Self {
        Self(format!("{chat_scope_id}:{user_id}"))
    }

    /// Wrap an already composed key (admin operations receive these).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Raw key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Privacy-preserving form for logs: first 8 hex chars of SHA-256.
    pub fn masked(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        hex::encode(&digest[..4])
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Message event delivered by the hosting framework.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Chat scope identifier (group, channel, DM thread)
    pub chat_scope_id: String,
    /// User identifier within the scope
    pub user_id: String,
    /// Message text
    pub text: String,
    /// Whether the bot was mentioned or addressed
    pub is_bot_mentioned: bool,
    /// Whether the host recognizes the sender as an administrator
    pub caller_is_admin: bool,
}

impl InboundMessage {
    /// Identity key partitioning this sender's session state.
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::new(&self.chat_scope_id, &self.user_id)
    }
}
