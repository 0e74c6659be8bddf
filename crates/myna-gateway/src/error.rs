//! Error types for gateway operations

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors a gateway implementation may surface to the engine
#[derive(Debug, Error)]
pub enum Error {
    #[error("Channel not found: {0}")]
    ChannelNotFound(u64),

    #[error("Message not found: {0}")]
    MessageNotFound(u64),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Transport error: {0}")]
    Transport(String),
}
