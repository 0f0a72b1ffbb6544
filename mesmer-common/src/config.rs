//! Engine configuration snapshot.
//!
//! The engine never mutates a snapshot in place: admin operations build a new
//! value and swap it atomically, so in-flight sessions keep the attributes
//! they captured at start time.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::validation::Validate;

/// Resolved configuration snapshot read by the engine per operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Whether the engine reacts to inbound messages at all (default: true)
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Keywords that start a session when the bot is mentioned.
    /// Matched as case-sensitive substrings, first match wins; an empty list
    /// never triggers.
    #[serde(default)]
    pub trigger_keywords: Vec<String>,

    /// Label of the item a session attributes to the persona (default: "special device")
    #[serde(default = "default_item_name")]
    pub item_name: String,

    /// Session lifetime in seconds (default: 180)
    #[serde(default = "default_duration_seconds")]
    pub duration_seconds: u64,

    /// Sensitivity level 0-100 captured into session attributes (default: 50)
    #[serde(default = "default_sensitivity")]
    pub sensitivity: u8,

    /// Maximum number of concurrently active sessions (default: 10)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Seconds an identity must wait between successful triggers (default: 30)
    #[serde(default = "default_cooldown_seconds")]
    pub cooldown_seconds: u64,

    /// When true, only admin callers and authorized users may trigger
    #[serde(default)]
    pub admin_only: bool,

    /// Identity keys allowed to trigger. Empty means open to everyone unless
    /// `admin_only` is set; non-empty means this is the complete allow-list.
    #[serde(default)]
    pub authorized_users: Vec<String>,

    /// Custom directive template with `{item_name}` / `{sensitivity}`
    /// placeholders. `None` uses the built-in template.
    #[serde(default)]
    pub directive_template: Option<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_item_name() -> String {
    "special device".to_string()
}

fn default_duration_seconds() -> u64 {
    180
}

fn default_sensitivity() -> u8 {
    50
}

fn default_max_concurrent() -> usize {
    10
}

fn default_cooldown_seconds() -> u64 {
    30
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            trigger_keywords: Vec::new(),
            item_name: default_item_name(),
            duration_seconds: default_duration_seconds(),
            sensitivity: default_sensitivity(),
            max_concurrent: default_max_concurrent(),
            cooldown_seconds: default_cooldown_seconds(),
            admin_only: false,
            authorized_users: Vec::new(),
            directive_template: None,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a snapshot from TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|e| Error::ConfigInvalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a snapshot from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Session lifetime as a `Duration`.
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_seconds)
    }

    /// Cooldown window as a `Duration`.
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }

    /// Check allow-list membership for an identity key.
    pub fn is_authorized_user(&self, identity: &str) -> bool {
        self.authorized_users.iter().any(|u| u == identity)
    }
}
