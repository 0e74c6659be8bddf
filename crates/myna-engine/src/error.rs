//! Error types for macro operations

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, MacroError>;

/// Persistence backend failures
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Backend(String),
}

/// Outcomes of macro mutations and lookups.
/// Everything except `Persistence` is a routine answer to user input.
#[derive(Debug, Error)]
pub enum MacroError {
    /// Name or alias collides with a built-in command
    #[error("`{name}` is a reserved command name")]
    ReservedName { name: String },

    /// Name or alias collides with an existing macro in the same scope
    #[error("a macro or alias named `{name}` already exists in this scope")]
    Duplicate { name: String },

    #[error("no macro named `{name}` in this scope")]
    NotFound { name: String },

    #[error("macro `{name}` has no alias `{alias}`")]
    AliasNotFound { name: String, alias: String },

    #[error("persistence failure: {0}")]
    Persistence(#[from] PersistError),
}
