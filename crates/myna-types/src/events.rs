//! Inbound chat events consumed by the engine

use serde::{Deserialize, Serialize};

/// Guild member context resolved by the transport adapter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Member {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub roles: Vec<u64>,
    /// True when this member owns the guild
    #[serde(default)]
    pub is_owner: bool,
    #[serde(default)]
    pub bot: bool,
}

/// An inbound chat message with its context pre-resolved
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageEvent {
    pub message_id: u64,
    pub channel_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<u64>,
    /// None for webhook and system messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Member>,
    pub content: String,
}
