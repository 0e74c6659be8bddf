//! Bot and per-guild configuration

use std::fs;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Per-guild settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuildConfig {
    pub guild_id: u64,
    /// Trigger prefix; empty = triggering disabled for the guild
    #[serde(default)]
    pub prefix: String,
    /// Per-(channel, macro) cooldown window; None = no throttling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_cooldown_secs: Option<u64>,
    /// Channel receiving the invocation audit line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_channel: Option<u64>,
    /// Role granting Staff permission level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_role: Option<u64>,
}

impl GuildConfig {
    pub fn new(guild_id: u64, prefix: impl Into<String>) -> Self {
        Self {
            guild_id,
            prefix: prefix.into(),
            channel_cooldown_secs: None,
            log_channel: None,
            staff_role: None,
        }
    }

    pub fn with_cooldown(mut self, secs: u64) -> Self {
        self.channel_cooldown_secs = Some(secs);
        self
    }

    pub fn with_log_channel(mut self, channel_id: u64) -> Self {
        self.log_channel = Some(channel_id);
        self
    }

    pub fn with_staff_role(mut self, role_id: u64) -> Self {
        self.staff_role = Some(role_id);
        self
    }
}

/// Complete bot configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotConfig {
    /// Bot owner user id (always BotOwner permission level)
    #[serde(default)]
    pub owner_id: u64,
    /// Users whose messages are never treated as triggers
    #[serde(default)]
    pub ignored_users: Vec<u64>,
    #[serde(default, rename = "guild")]
    pub guilds: Vec<GuildConfig>,
}

impl BotConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    pub fn guild(&self, guild_id: u64) -> Option<&GuildConfig> {
        self.guilds.iter().find(|g| g.guild_id == guild_id)
    }

    pub fn is_ignored(&self, user_id: u64) -> bool {
        self.ignored_users.contains(&user_id)
    }

    pub fn with_guild(mut self, guild: GuildConfig) -> Self {
        self.guilds.push(guild);
        self
    }
}
