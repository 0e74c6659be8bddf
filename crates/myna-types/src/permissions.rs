//! Member permission levels

use serde::{Deserialize, Serialize};

use crate::config::BotConfig;
use crate::events::Member;

/// Privilege levels, most privileged first
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    BotOwner,
    GuildOwner,
    Staff,
    User,
    Everyone,
}

impl PermissionLevel {
    /// A holder of `self` may act when `required` is this strict or looser
    pub fn allows(self, required: PermissionLevel) -> bool {
        self <= required
    }
}

/// Derive a member's level from the bot and guild configuration
pub fn level_for(member: &Member, config: &BotConfig, guild_id: u64) -> PermissionLevel {
    if member.id == config.owner_id {
        return PermissionLevel::BotOwner;
    }
    if member.is_owner {
        return PermissionLevel::GuildOwner;
    }
    if let Some(role) = config.guild(guild_id).and_then(|g| g.staff_role) {
        if member.roles.contains(&role) {
            return PermissionLevel::Staff;
        }
    }
    PermissionLevel::User
}
