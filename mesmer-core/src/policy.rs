//! Authorization policy for trigger attempts.

use mesmer_common::EngineConfig;

use crate::message::IdentityKey;

/// Decide whether an identity may start a session under the given snapshot.
///
/// - Engine disabled: always denied (callers check this earlier, but the
///   policy must hold on its own).
/// - Admin-only mode: admin callers and allow-listed identities pass.
/// - Otherwise: an empty allow-list is open to everyone; a non-empty one is
///   the complete set of permitted identities.
pub fn is_authorized(identity: &IdentityKey, is_admin_caller: bool, config: &EngineConfig) -> bool {
    if !config.enabled {
        return false;
    }

    if config.admin_only {
        return is_admin_caller || config.is_authorized_user(identity.as_str());
    }

    config.authorized_users.is_empty() || config.is_authorized_user(identity.as_str())
}
