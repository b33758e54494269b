//! Moderation rules loaded from the JSON rules file.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Longest mute the platforms accept: 29 days 23 hours 59 minutes, in ms.
pub const MAX_MUTE_MS: u64 = ((29 * 24 + 23) * 60 + 59) * 60 * 1000;

const MINUTE_MS: u64 = 60 * 1000;

/// Authority given to users absent from the authority table.
pub const DEFAULT_AUTHORITY: u8 = 1;

/// Authority given to bot owners.
pub const OWNER_AUTHORITY: u8 = 4;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read rules file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid rules file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("autoUnban.minDelay ({min}) is greater than autoUnban.maxDelay ({max})")]
    DelayBounds { min: u64, max: u64 },
}

/// Per-group blocklist rule, keyed by `platform:guildId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockingRule {
    pub enable: bool,
    /// Regular expressions, tested in order.
    pub blocking_words: Vec<String>,
    pub mute: bool,
    /// Milliseconds.
    pub mute_duration: u64,
    pub recall: bool,
    pub tip: bool,
}

impl Default for BlockingRule {
    fn default() -> Self {
        Self {
            enable: true,
            blocking_words: Vec::new(),
            mute: false,
            mute_duration: 10 * MINUTE_MS,
            recall: false,
            tip: true,
        }
    }
}

/// Delayed self-unmute for `ban-me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutoUnban {
    pub enable: bool,
    /// Self-mutes longer than this get an auto-unban timer.
    pub max_duration: u64,
    pub min_delay: u64,
    pub max_delay: u64,
}

impl Default for AutoUnban {
    fn default() -> Self {
        Self {
            enable: true,
            max_duration: 60 * MINUTE_MS,
            min_delay: MINUTE_MS,
            max_delay: 5 * MINUTE_MS,
        }
    }
}

/// Everything the matcher and the commands read. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginConfig {
    /// `platform:guildId` -> rule
    pub rules: HashMap<String, BlockingRule>,
    /// Users whose authority equals a command's required level must also be
    /// group admins.
    pub check_admin: bool,
    pub default_mute_duration: u64,
    pub auto_unban: AutoUnban,
    /// `platform:userId` -> authority level
    pub authorities: HashMap<String, u8>,
    pub locale: Option<String>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            rules: HashMap::new(),
            check_admin: true,
            default_mute_duration: 10 * MINUTE_MS,
            auto_unban: AutoUnban::default(),
            authorities: HashMap::new(),
            locale: None,
        }
    }
}

impl PluginConfig {
    /// Parse and normalize a JSON document.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.normalized()
    }

    /// Read the rules file. A missing file yields the default config.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(raw) => {
                let config = Self::from_json(&raw)?;
                info!(
                    "Loaded {} blocking rule(s) from {}",
                    config.rules.len(),
                    path.display()
                );
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Rules file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    /// Clamp durations into the platform range and validate delay bounds.
    fn normalized(mut self) -> Result<Self, ConfigError> {
        if self.auto_unban.min_delay > self.auto_unban.max_delay {
            return Err(ConfigError::DelayBounds {
                min: self.auto_unban.min_delay,
                max: self.auto_unban.max_delay,
            });
        }

        for rule in self.rules.values_mut() {
            rule.mute_duration = rule.mute_duration.min(MAX_MUTE_MS);
        }
        self.default_mute_duration = self.default_mute_duration.min(MAX_MUTE_MS);
        self.auto_unban.max_duration = self.auto_unban.max_duration.min(MAX_MUTE_MS);

        Ok(self)
    }

    /// Rule for a `platform:guildId` key.
    pub fn rule(&self, key: &str) -> Option<&BlockingRule> {
        self.rules.get(key)
    }

    /// Authority level of a user on a platform.
    pub fn authority(&self, platform: &str, user_id: &str) -> u8 {
        self.authorities
            .get(&format!("{platform}:{user_id}"))
            .copied()
            .unwrap_or(DEFAULT_AUTHORITY)
    }
}

/// Reloadable handle. Readers take an `Arc` snapshot per request.
#[derive(Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<Arc<PluginConfig>>>,
}

impl SharedConfig {
    pub fn new(config: PluginConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    pub fn snapshot(&self) -> Arc<PluginConfig> {
        Arc::clone(&self.inner.read())
    }

    /// Swap in a new configuration wholesale.
    pub fn replace(&self, config: PluginConfig) {
        *self.inner.write() = Arc::new(config);
    }
}
