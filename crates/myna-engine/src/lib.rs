//! Guild macro engine: storage, resolution, fuzzy search, cooldowns, triggers
//!
//! The entry points are [`MacroStore`] (scoped storage with write-through
//! persistence), [`Resolver`] (precedence-aware token lookup),
//! [`TriggerListener`] (the inbound message pipeline), and [`MacroService`]
//! (command-facing orchestration).

pub mod cooldown;
pub mod error;
pub mod listener;
pub mod persist;
pub mod resolver;
pub mod search;
pub mod service;
pub mod store;

pub use cooldown::{CooldownKey, CooldownTracker};
pub use error::{MacroError, PersistError, Result};
pub use listener::{TriggerListener, TriggerOutcome};
pub use persist::{JsonFileRepository, MacroRepository, MemoryRepository};
pub use resolver::Resolver;
pub use search::{ContentMatch, LexicalSimilarity, NameMatch, RankedMatch, Similarity};
pub use service::MacroService;
pub use store::MacroStore;
