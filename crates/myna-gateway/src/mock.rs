//! In-memory mock gateway for unit testing without a chat platform.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use myna_types::OutgoingMessage;

use crate::error::Result;
use crate::gateway::Gateway;

/// One recorded gateway call
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    SendMessage {
        channel_id: u64,
        message: OutgoingMessage,
    },
    DeleteMessage {
        channel_id: u64,
        message_id: u64,
    },
    AddReaction {
        channel_id: u64,
        message_id: u64,
        emoji: String,
    },
}

/// In-memory gateway that records every call.
/// Use in tests instead of a platform transport.
///
/// # Example
/// ```rust,ignore
/// let mock = MockGateway::new();
/// listener.handle_message(&event).await.unwrap();
/// assert_eq!(mock.sent_texts(), vec![(100, "pong".to_string())]);
/// ```
#[derive(Clone, Default)]
pub struct MockGateway {
    calls: Arc<Mutex<Vec<GatewayCall>>>,
    channel_names: Arc<Mutex<HashMap<u64, String>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a display name returned by `channel_name`
    pub fn set_channel_name(&self, channel_id: u64, name: impl Into<String>) {
        self.channel_names
            .lock()
            .unwrap()
            .insert(channel_id, name.into());
    }

    /// Snapshot of all recorded calls in call order
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.calls.lock().unwrap().is_empty()
    }

    /// Plain-text sends so far, as (channel_id, content)
    pub fn sent_texts(&self) -> Vec<(u64, String)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                GatewayCall::SendMessage {
                    channel_id,
                    message: OutgoingMessage::Text(content),
                } => Some((*channel_id, content.clone())),
                _ => None,
            })
            .collect()
    }

    /// Deletions so far, as (channel_id, message_id)
    pub fn deleted(&self) -> Vec<(u64, u64)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                GatewayCall::DeleteMessage {
                    channel_id,
                    message_id,
                } => Some((*channel_id, *message_id)),
                _ => None,
            })
            .collect()
    }

    /// Reactions so far, as (channel_id, message_id, emoji)
    pub fn reactions(&self) -> Vec<(u64, u64, String)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                GatewayCall::AddReaction {
                    channel_id,
                    message_id,
                    emoji,
                } => Some((*channel_id, *message_id, emoji.clone())),
                _ => None,
            })
            .collect()
    }
}

impl Gateway for MockGateway {
    async fn send_message(&self, channel_id: u64, message: OutgoingMessage) -> Result<()> {
        self.calls.lock().unwrap().push(GatewayCall::SendMessage {
            channel_id,
            message,
        });
        Ok(())
    }

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<()> {
        self.calls.lock().unwrap().push(GatewayCall::DeleteMessage {
            channel_id,
            message_id,
        });
        Ok(())
    }

    async fn add_reaction(&self, channel_id: u64, message_id: u64, emoji: &str) -> Result<()> {
        self.calls.lock().unwrap().push(GatewayCall::AddReaction {
            channel_id,
            message_id,
            emoji: emoji.to_string(),
        });
        Ok(())
    }

    async fn channel_name(&self, channel_id: u64) -> Result<Option<String>> {
        Ok(self.channel_names.lock().unwrap().get(&channel_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_calls_in_order() {
        let mock = MockGateway::new();
        assert!(mock.is_empty());

        mock.send_message(100, OutgoingMessage::text("pong"))
            .await
            .unwrap();
        mock.delete_message(100, 1).await.unwrap();
        mock.add_reaction(100, 2, "👀").await.unwrap();

        assert_eq!(mock.call_count(), 3);
        assert_eq!(mock.sent_texts(), vec![(100, "pong".to_string())]);
        assert_eq!(mock.deleted(), vec![(100, 1)]);
        assert_eq!(mock.reactions(), vec![(100, 2, "👀".to_string())]);

        mock.clear();
        assert!(mock.is_empty());
    }

    #[tokio::test]
    async fn test_channel_name_lookup() {
        let mock = MockGateway::new();
        mock.set_channel_name(100, "general");
        assert_eq!(
            mock.channel_name(100).await.unwrap(),
            Some("general".to_string())
        );
        assert_eq!(mock.channel_name(101).await.unwrap(), None);
    }
}
