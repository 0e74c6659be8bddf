//! Guild macro storage with write-through persistence

#[path = "store_tests.rs"]
mod store_tests;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use myna_types::{GuildMacros, Macro, MacroKey};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::error::{MacroError, Result};
use crate::persist::MacroRepository;

/// Per-guild macro tables with duplicate guards and write-through persistence.
///
/// An outer map hands out independently locked tables, so work on different
/// guilds never contends. Mutations apply to a copy, save it, and only then
/// commit to memory: an observed change is always durable, and a failed save
/// leaves the table untouched.
pub struct MacroStore<R> {
    repo: R,
    reserved: HashSet<String>,
    guilds: RwLock<HashMap<u64, Arc<Mutex<GuildMacros>>>>,
}

impl<R: MacroRepository> MacroStore<R> {
    /// `reserved_names` are the bot's built-in command names (and their
    /// aliases), which macros may never collide with
    pub fn new(repo: R, reserved_names: impl IntoIterator<Item = String>) -> Self {
        Self {
            repo,
            reserved: reserved_names
                .into_iter()
                .map(|n| n.to_lowercase())
                .collect(),
            guilds: RwLock::new(HashMap::new()),
        }
    }

    /// Eagerly load every stored guild table, returning how many were loaded
    pub async fn preload(&self) -> Result<usize> {
        let ids = self.repo.stored_guilds().await?;
        for guild_id in &ids {
            self.table(*guild_id).await?;
        }
        debug!("Preloaded {} guild macro tables", ids.len());
        Ok(ids.len())
    }

    /// The guild's table, loaded from the repository on first access
    async fn table(&self, guild_id: u64) -> Result<Arc<Mutex<GuildMacros>>> {
        if let Some(table) = self.guilds.read().await.get(&guild_id) {
            return Ok(table.clone());
        }
        let mut guilds = self.guilds.write().await;
        // another task may have loaded it while we waited for the write lock
        if let Some(table) = guilds.get(&guild_id) {
            return Ok(table.clone());
        }
        let loaded = self.repo.load(guild_id).await?.unwrap_or_default();
        let table = Arc::new(Mutex::new(loaded));
        guilds.insert(guild_id, table.clone());
        Ok(table)
    }

    /// Apply a mutation with write-through persistence
    async fn commit<F>(&self, guild_id: u64, mutate: F) -> Result<Macro>
    where
        F: FnOnce(&mut GuildMacros) -> Result<Macro>,
    {
        let table = self.table(guild_id).await?;
        let mut live = table.lock().await;
        let mut draft = live.clone();
        let out = mutate(&mut draft)?;
        self.repo.save(guild_id, &draft).await?;
        *live = draft;
        Ok(out)
    }

    fn check_reserved(&self, token: &str) -> Result<()> {
        if self.reserved.contains(token) {
            return Err(MacroError::ReservedName {
                name: token.to_string(),
            });
        }
        Ok(())
    }

    // ── Mutations ──────────────────────────────────────────────────────────

    /// Register a macro; `channel` = None makes it global
    pub async fn add(
        &self,
        guild_id: u64,
        name: &str,
        category: &str,
        channel: Option<u64>,
        contents: &str,
    ) -> Result<Macro> {
        let name = name.to_lowercase();
        self.check_reserved(&name)?;
        let category = category.to_string();
        let contents = contents.to_string();
        self.commit(guild_id, move |t| {
            if t.find_token(&name, channel).is_some() {
                return Err(MacroError::Duplicate { name: name.clone() });
            }
            let m = Macro::new(name, contents, channel, category);
            t.insert(m.clone());
            Ok(m)
        })
        .await
    }

    /// Remove a macro, returning the removed record
    pub async fn remove(&self, guild_id: u64, name: &str, channel: Option<u64>) -> Result<Macro> {
        let key = MacroKey::scoped(name.to_lowercase(), channel);
        self.commit(guild_id, move |t| {
            t.remove(&key).ok_or_else(|| MacroError::NotFound {
                name: key.name.clone(),
            })
        })
        .await
    }

    /// Replace a macro's contents
    pub async fn edit_contents(
        &self,
        guild_id: u64,
        name: &str,
        channel: Option<u64>,
        contents: &str,
    ) -> Result<Macro> {
        let key = MacroKey::scoped(name.to_lowercase(), channel);
        let contents = contents.to_string();
        self.commit(guild_id, move |t| {
            let m = t.get_mut(&key).ok_or_else(|| MacroError::NotFound {
                name: key.name.clone(),
            })?;
            m.contents = contents;
            Ok(m.clone())
        })
        .await
    }

    /// Move a macro to another category
    pub async fn edit_category(
        &self,
        guild_id: u64,
        name: &str,
        channel: Option<u64>,
        category: &str,
    ) -> Result<Macro> {
        let key = MacroKey::scoped(name.to_lowercase(), channel);
        let category = category.to_lowercase();
        self.commit(guild_id, move |t| {
            let m = t.get_mut(&key).ok_or_else(|| MacroError::NotFound {
                name: key.name.clone(),
            })?;
            m.category = category;
            Ok(m.clone())
        })
        .await
    }

    /// Attach an extra trigger token to an existing macro
    pub async fn add_alias(
        &self,
        guild_id: u64,
        name: &str,
        channel: Option<u64>,
        alias: &str,
    ) -> Result<Macro> {
        let alias = alias.to_lowercase();
        self.check_reserved(&alias)?;
        let key = MacroKey::scoped(name.to_lowercase(), channel);
        self.commit(guild_id, move |t| {
            if t.find_token(&alias, channel).is_some() {
                return Err(MacroError::Duplicate {
                    name: alias.clone(),
                });
            }
            let m = t.get_mut(&key).ok_or_else(|| MacroError::NotFound {
                name: key.name.clone(),
            })?;
            m.aliases.insert(alias);
            Ok(m.clone())
        })
        .await
    }

    /// Detach an alias; `AliasNotFound` when the macro exists without it
    pub async fn remove_alias(
        &self,
        guild_id: u64,
        name: &str,
        channel: Option<u64>,
        alias: &str,
    ) -> Result<Macro> {
        let alias = alias.to_lowercase();
        let key = MacroKey::scoped(name.to_lowercase(), channel);
        self.commit(guild_id, move |t| {
            let m = t.get_mut(&key).ok_or_else(|| MacroError::NotFound {
                name: key.name.clone(),
            })?;
            if !m.aliases.remove(&alias) {
                return Err(MacroError::AliasNotFound {
                    name: key.name.clone(),
                    alias,
                });
            }
            Ok(m.clone())
        })
        .await
    }

    // ── Lookups ────────────────────────────────────────────────────────────

    /// Exact-match lookup against one scope, aliases included.
    /// No precedence and no side effects.
    pub async fn find_by_name_or_alias(
        &self,
        guild_id: u64,
        token: &str,
        channel: Option<u64>,
    ) -> Option<Macro> {
        let token = token.to_lowercase();
        let table = match self.table(guild_id).await {
            Ok(table) => table,
            Err(e) => {
                warn!("Failed to load macros for guild {}: {}", guild_id, e);
                return None;
            }
        };
        let t = table.lock().await;
        t.find_token(&token, channel).cloned()
    }

    /// Guarded read access to the guild's whole table
    pub async fn for_guild<F, T>(&self, guild_id: u64, f: F) -> Result<T>
    where
        F: FnOnce(&GuildMacros) -> T,
    {
        let table = self.table(guild_id).await?;
        let t = table.lock().await;
        Ok(f(&t))
    }

    /// Count one successful trigger. Persistence here is best effort: the
    /// counter survives in memory and rides along with the next save.
    pub(crate) async fn record_use(&self, guild_id: u64, key: &MacroKey) -> Option<Macro> {
        let table = match self.table(guild_id).await {
            Ok(table) => table,
            Err(e) => {
                warn!("Failed to load macros for guild {}: {}", guild_id, e);
                return None;
            }
        };
        let mut live = table.lock().await;
        let m = live.get_mut(key)?;
        m.uses += 1;
        let snapshot = m.clone();
        if let Err(e) = self.repo.save(guild_id, &live).await {
            warn!("Failed to persist use count for guild {}: {}", guild_id, e);
        }
        Some(snapshot)
    }
}
