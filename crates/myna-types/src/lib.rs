//! Shared types for the myna macro engine

pub mod config;
pub mod events;
pub mod macros;
pub mod outbound;
pub mod permissions;

pub use config::{BotConfig, ConfigError, GuildConfig};
pub use events::{Member, MessageEvent};
pub use macros::{GuildMacros, Macro, MacroKey};
pub use outbound::{OutgoingMessage, Page, PageField};
pub use permissions::{level_for, PermissionLevel};
