//! Unit tests for MacroStore

#[cfg(test)]
mod tests {
    use crate::error::MacroError;
    use crate::persist::MemoryRepository;
    use crate::store::MacroStore;

    const GUILD: u64 = 700;

    /// Build a store over an in-memory repository with no reserved names.
    fn make_store() -> MacroStore<MemoryRepository> {
        MacroStore::new(MemoryRepository::new(), [])
    }

    fn make_store_with_reserved(names: &[&str]) -> MacroStore<MemoryRepository> {
        MacroStore::new(
            MemoryRepository::new(),
            names.iter().map(|n| n.to_string()),
        )
    }

    #[tokio::test]
    async fn test_add_and_find() {
        let store = make_store();
        store
            .add(GUILD, "ping", "misc", None, "pong")
            .await
            .unwrap();

        let found = store.find_by_name_or_alias(GUILD, "ping", None).await;
        assert_eq!(found.unwrap().contents, "pong");
    }

    #[tokio::test]
    async fn test_add_lowercases_name_and_category() {
        let store = make_store();
        let m = store
            .add(GUILD, "FAQ", "Help", None, "read the docs")
            .await
            .unwrap();

        assert_eq!(m.name, "faq");
        assert_eq!(m.category, "help");
        assert!(store.find_by_name_or_alias(GUILD, "FaQ", None).await.is_some());
    }

    #[tokio::test]
    async fn test_add_rejects_reserved_name() {
        let store = make_store_with_reserved(&["help"]);
        let err = store
            .add(GUILD, "Help", "misc", None, "nope")
            .await
            .unwrap_err();

        assert!(matches!(err, MacroError::ReservedName { .. }));
    }

    #[tokio::test]
    async fn test_add_rejects_duplicate_name_in_same_scope() {
        let store = make_store();
        store
            .add(GUILD, "ping", "misc", None, "pong")
            .await
            .unwrap();

        let err = store
            .add(GUILD, "ping", "misc", None, "pong again")
            .await
            .unwrap_err();
        assert!(matches!(err, MacroError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn test_add_rejects_name_colliding_with_alias() {
        let store = make_store();
        store
            .add(GUILD, "ping", "misc", None, "pong")
            .await
            .unwrap();
        store.add_alias(GUILD, "ping", None, "p").await.unwrap();

        let err = store.add(GUILD, "p", "misc", None, "other").await.unwrap_err();
        assert!(matches!(err, MacroError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn test_same_name_allowed_in_different_scopes() {
        let store = make_store();
        store
            .add(GUILD, "rules", "info", None, "global rules")
            .await
            .unwrap();
        store
            .add(GUILD, "rules", "info", Some(5), "channel rules")
            .await
            .unwrap();

        let global = store.find_by_name_or_alias(GUILD, "rules", None).await;
        let scoped = store.find_by_name_or_alias(GUILD, "rules", Some(5)).await;
        assert_eq!(global.unwrap().contents, "global rules");
        assert_eq!(scoped.unwrap().contents, "channel rules");
    }

    #[tokio::test]
    async fn test_remove_returns_record_and_clears_table() {
        let store = make_store();
        store
            .add(GUILD, "ping", "misc", None, "pong")
            .await
            .unwrap();

        let removed = store.remove(GUILD, "ping", None).await.unwrap();
        assert_eq!(removed.name, "ping");
        assert!(store.find_by_name_or_alias(GUILD, "ping", None).await.is_none());
    }

    #[tokio::test]
    async fn test_remove_missing_is_not_found() {
        let store = make_store();
        let err = store.remove(GUILD, "ghost", None).await.unwrap_err();
        assert!(matches!(err, MacroError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_remove_requires_matching_scope() {
        let store = make_store();
        store
            .add(GUILD, "rules", "info", Some(5), "channel rules")
            .await
            .unwrap();

        // the global key does not match a channel-scoped macro
        let err = store.remove(GUILD, "rules", None).await.unwrap_err();
        assert!(matches!(err, MacroError::NotFound { .. }));
        assert!(store
            .find_by_name_or_alias(GUILD, "rules", Some(5))
            .await
            .is_some());
    }

    #[tokio::test]
    async fn test_edit_contents() {
        let store = make_store();
        store
            .add(GUILD, "ping", "misc", None, "pong")
            .await
            .unwrap();

        let m = store
            .edit_contents(GUILD, "ping", None, "PONG!")
            .await
            .unwrap();
        assert_eq!(m.contents, "PONG!");

        let found = store.find_by_name_or_alias(GUILD, "ping", None).await;
        assert_eq!(found.unwrap().contents, "PONG!");
    }

    #[tokio::test]
    async fn test_edit_category_lowercases() {
        let store = make_store();
        store
            .add(GUILD, "ping", "misc", None, "pong")
            .await
            .unwrap();

        let m = store
            .edit_category(GUILD, "ping", None, "Games")
            .await
            .unwrap();
        assert_eq!(m.category, "games");
    }

    #[tokio::test]
    async fn test_alias_roundtrip() {
        let store = make_store();
        store
            .add(GUILD, "ping", "misc", None, "pong")
            .await
            .unwrap();

        let m = store.add_alias(GUILD, "ping", None, "P").await.unwrap();
        assert!(m.aliases.contains("p"));
        assert!(store.find_by_name_or_alias(GUILD, "p", None).await.is_some());

        let m = store.remove_alias(GUILD, "ping", None, "p").await.unwrap();
        assert!(m.aliases.is_empty());
        assert!(store.find_by_name_or_alias(GUILD, "p", None).await.is_none());
    }

    #[tokio::test]
    async fn test_add_alias_rejects_reserved() {
        let store = make_store_with_reserved(&["help"]);
        store
            .add(GUILD, "ping", "misc", None, "pong")
            .await
            .unwrap();

        let err = store.add_alias(GUILD, "ping", None, "help").await.unwrap_err();
        assert!(matches!(err, MacroError::ReservedName { .. }));
    }

    #[tokio::test]
    async fn test_add_alias_rejects_taken_token() {
        let store = make_store();
        store
            .add(GUILD, "ping", "misc", None, "pong")
            .await
            .unwrap();
        store
            .add(GUILD, "pong", "misc", None, "ping")
            .await
            .unwrap();

        let err = store.add_alias(GUILD, "ping", None, "pong").await.unwrap_err();
        assert!(matches!(err, MacroError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn test_remove_alias_missing_alias() {
        let store = make_store();
        store
            .add(GUILD, "ping", "misc", None, "pong")
            .await
            .unwrap();

        let err = store
            .remove_alias(GUILD, "ping", None, "nope")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MacroError::AliasNotFound { ref alias, .. } if alias == "nope"
        ));
    }

    #[tokio::test]
    async fn test_mutations_write_through() {
        let repo = MemoryRepository::new();
        let store = MacroStore::new(repo.clone(), []);
        store
            .add(GUILD, "ping", "misc", None, "pong")
            .await
            .unwrap();

        let stored = repo.stored(GUILD).unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored.get(&myna_types::MacroKey::global("ping")).is_some());
    }

    #[tokio::test]
    async fn test_failed_save_rolls_back() {
        let repo = MemoryRepository::new();
        let store = MacroStore::new(repo.clone(), []);
        store
            .add(GUILD, "ping", "misc", None, "pong")
            .await
            .unwrap();

        repo.set_failing(true);
        let err = store.add(GUILD, "pong", "misc", None, "ping").await.unwrap_err();
        assert!(matches!(err, MacroError::Persistence(_)));

        // the in-memory table must still match what was last persisted
        repo.set_failing(false);
        let count = store.for_guild(GUILD, |t| t.len()).await.unwrap();
        assert_eq!(count, 1);
        assert!(store.find_by_name_or_alias(GUILD, "pong", None).await.is_none());
    }

    #[tokio::test]
    async fn test_lazy_load_from_repository() {
        let repo = MemoryRepository::new();
        {
            let seed = MacroStore::new(repo.clone(), []);
            seed.add(GUILD, "ping", "misc", None, "pong").await.unwrap();
        }

        // a fresh store sees the previously saved table on first access
        let store = MacroStore::new(repo, []);
        let found = store.find_by_name_or_alias(GUILD, "ping", None).await;
        assert_eq!(found.unwrap().contents, "pong");
    }

    #[tokio::test]
    async fn test_preload_loads_all_stored_guilds() {
        let repo = MemoryRepository::new();
        {
            let seed = MacroStore::new(repo.clone(), []);
            seed.add(1, "a", "misc", None, "1").await.unwrap();
            seed.add(2, "b", "misc", None, "2").await.unwrap();
        }

        let store = MacroStore::new(repo, []);
        let loaded = store.preload().await.unwrap();
        assert_eq!(loaded, 2);
    }

    #[tokio::test]
    async fn test_guilds_are_isolated() {
        let store = make_store();
        store.add(1, "ping", "misc", None, "one").await.unwrap();
        store.add(2, "ping", "misc", None, "two").await.unwrap();

        let one = store.find_by_name_or_alias(1, "ping", None).await;
        let two = store.find_by_name_or_alias(2, "ping", None).await;
        assert_eq!(one.unwrap().contents, "one");
        assert_eq!(two.unwrap().contents, "two");
    }
}
