//! Two-phase trigger resolution

use std::sync::Arc;

use myna_types::Macro;
use tracing::warn;

use crate::persist::MacroRepository;
use crate::store::MacroStore;

/// Resolves trigger tokens against a guild's macros.
///
/// `lookup` answers "would this fire" without side effects, `resolve` commits
/// the trigger and bumps the use counter. The split lets callers put a gate
/// between the two, so a blocked trigger is never counted.
pub struct Resolver<R> {
    store: Arc<MacroStore<R>>,
}

impl<R> Clone for Resolver<R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<R: MacroRepository> Resolver<R> {
    pub fn new(store: Arc<MacroStore<R>>) -> Self {
        Self { store }
    }

    /// The macro `token` would fire in `channel_id`, channel scope winning
    /// over global. Read-only.
    pub async fn lookup(&self, guild_id: u64, channel_id: u64, token: &str) -> Option<Macro> {
        let token = token.to_lowercase();
        match self
            .store
            .for_guild(guild_id, |t| {
                t.resolve_key(&token, channel_id)
                    .and_then(|key| t.get(&key))
                    .cloned()
            })
            .await
        {
            Ok(found) => found,
            Err(e) => {
                warn!("Macro lookup failed for guild {}: {}", guild_id, e);
                None
            }
        }
    }

    /// Commit a trigger: resolve the token and count the use.
    /// Returns None when nothing matches (or the macro vanished in between).
    pub async fn resolve(&self, guild_id: u64, channel_id: u64, token: &str) -> Option<Macro> {
        let token = token.to_lowercase();
        let key = match self
            .store
            .for_guild(guild_id, |t| t.resolve_key(&token, channel_id))
            .await
        {
            Ok(key) => key?,
            Err(e) => {
                warn!("Macro lookup failed for guild {}: {}", guild_id, e);
                return None;
            }
        };
        self.store.record_use(guild_id, &key).await
    }

    /// Every macro visible in the channel, shadowed globals excluded
    pub async fn available_in(&self, guild_id: u64, channel_id: u64) -> Vec<Macro> {
        match self
            .store
            .for_guild(guild_id, |t| {
                t.available_in(channel_id).into_iter().cloned().collect()
            })
            .await
        {
            Ok(found) => found,
            Err(e) => {
                warn!("Macro listing failed for guild {}: {}", guild_id, e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryRepository;

    const GUILD: u64 = 700;
    const CHANNEL: u64 = 5;

    fn make_resolver() -> (Resolver<MemoryRepository>, Arc<MacroStore<MemoryRepository>>) {
        let store = Arc::new(MacroStore::new(MemoryRepository::new(), []));
        (Resolver::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_channel_macro_shadows_global() {
        let (resolver, store) = make_resolver();
        store
            .add(GUILD, "rules", "info", None, "global rules")
            .await
            .unwrap();
        store
            .add(GUILD, "rules", "info", Some(CHANNEL), "channel rules")
            .await
            .unwrap();

        let found = resolver.lookup(GUILD, CHANNEL, "rules").await.unwrap();
        assert_eq!(found.contents, "channel rules");

        // other channels still see the global one
        let found = resolver.lookup(GUILD, 9, "rules").await.unwrap();
        assert_eq!(found.contents, "global rules");
    }

    #[tokio::test]
    async fn test_alias_resolves_to_owner() {
        let (resolver, store) = make_resolver();
        store
            .add(GUILD, "ping", "misc", None, "pong")
            .await
            .unwrap();
        store.add_alias(GUILD, "ping", None, "p").await.unwrap();

        let found = resolver.resolve(GUILD, CHANNEL, "P").await.unwrap();
        assert_eq!(found.name, "ping");
        assert_eq!(found.uses, 1);
    }

    #[tokio::test]
    async fn test_lookup_does_not_count() {
        let (resolver, store) = make_resolver();
        store
            .add(GUILD, "ping", "misc", None, "pong")
            .await
            .unwrap();

        resolver.lookup(GUILD, CHANNEL, "ping").await.unwrap();
        resolver.lookup(GUILD, CHANNEL, "ping").await.unwrap();

        let uses = store
            .for_guild(GUILD, |t| {
                t.find_token("ping", None).map(|m| m.uses).unwrap_or(0)
            })
            .await
            .unwrap();
        assert_eq!(uses, 0);
    }

    #[tokio::test]
    async fn test_resolve_counts_and_persists() {
        let repo = MemoryRepository::new();
        let store = Arc::new(MacroStore::new(repo.clone(), []));
        let resolver = Resolver::new(store.clone());
        store
            .add(GUILD, "ping", "misc", None, "pong")
            .await
            .unwrap();

        let found = resolver.resolve(GUILD, CHANNEL, "ping").await.unwrap();
        assert_eq!(found.uses, 1);

        let stored = repo.stored(GUILD).unwrap();
        let key = myna_types::MacroKey::global("ping");
        assert_eq!(stored.get(&key).unwrap().uses, 1);
    }

    #[tokio::test]
    async fn test_resolve_survives_failed_persist() {
        let repo = MemoryRepository::new();
        let store = Arc::new(MacroStore::new(repo.clone(), []));
        let resolver = Resolver::new(store.clone());
        store
            .add(GUILD, "ping", "misc", None, "pong")
            .await
            .unwrap();

        repo.set_failing(true);
        let found = resolver.resolve(GUILD, CHANNEL, "ping").await.unwrap();
        assert_eq!(found.uses, 1);

        // the counter lives on in memory even though the save failed
        let uses = store
            .for_guild(GUILD, |t| {
                t.find_token("ping", None).map(|m| m.uses).unwrap_or(0)
            })
            .await
            .unwrap();
        assert_eq!(uses, 1);
    }

    #[tokio::test]
    async fn test_unknown_token_is_none() {
        let (resolver, _store) = make_resolver();
        assert!(resolver.lookup(GUILD, CHANNEL, "ghost").await.is_none());
        assert!(resolver.resolve(GUILD, CHANNEL, "ghost").await.is_none());
    }

    #[tokio::test]
    async fn test_available_in_excludes_shadowed_global() {
        let (resolver, store) = make_resolver();
        store
            .add(GUILD, "rules", "info", None, "global rules")
            .await
            .unwrap();
        store
            .add(GUILD, "rules", "info", Some(CHANNEL), "channel rules")
            .await
            .unwrap();
        store
            .add(GUILD, "ping", "misc", None, "pong")
            .await
            .unwrap();

        let visible = resolver.available_in(GUILD, CHANNEL).await;
        assert_eq!(visible.len(), 2);
        assert!(visible
            .iter()
            .all(|m| m.name == "ping" || m.contents == "channel rules"));
    }
}
