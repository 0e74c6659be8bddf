//! The messaging gateway trait

use myna_types::OutgoingMessage;

use crate::error::Result;

/// Everything the engine asks of the chat platform.
/// Implemented by platform transports and by `MockGateway` (in-memory, tests).
/// Guild and member context arrive pre-resolved on inbound events, so the
/// engine only ever needs channel-level operations here.
#[allow(async_fn_in_trait)]
pub trait Gateway: Send + Sync {
    /// Deliver a reply into a channel
    async fn send_message(&self, channel_id: u64, message: OutgoingMessage) -> Result<()>;

    /// Delete a message (used to consume trigger messages)
    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<()>;

    /// React to a message with a unicode emoji
    async fn add_reaction(&self, channel_id: u64, message_id: u64, emoji: &str) -> Result<()>;

    /// Display name of a channel, if the platform knows it
    async fn channel_name(&self, channel_id: u64) -> Result<Option<String>>;
}

/// `#name` when the gateway knows the channel, the `<#id>` mention form
/// otherwise. Lookup failures fall back to the mention form too.
pub async fn display_channel(gateway: &impl Gateway, channel_id: u64) -> String {
    match gateway.channel_name(channel_id).await {
        Ok(Some(name)) => format!("#{}", name),
        _ => format!("<#{}>", channel_id),
    }
}
