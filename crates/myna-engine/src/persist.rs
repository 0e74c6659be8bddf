//! Persistence backends for guild macro tables
//!
//! Tables are stored per guild as a flat list of macro records; each record
//! carries its own scope, so the table rebuilds its keys on load.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use myna_types::{GuildMacros, Macro};
use tracing::debug;

use crate::error::PersistError;

/// Storage seam for per-guild macro tables.
/// Implemented by `JsonFileRepository` (real) and `MemoryRepository` (tests).
#[allow(async_fn_in_trait)]
pub trait MacroRepository: Send + Sync {
    /// Load one guild's table; `Ok(None)` when the guild has nothing stored
    async fn load(&self, guild_id: u64) -> Result<Option<GuildMacros>, PersistError>;

    /// Durably store one guild's table
    async fn save(&self, guild_id: u64, table: &GuildMacros) -> Result<(), PersistError>;

    /// Guild ids with stored tables
    async fn stored_guilds(&self) -> Result<Vec<u64>, PersistError>;
}

/// In-memory repository that can be switched to fail saves.
/// Use in tests instead of a real backend.
#[derive(Clone, Default)]
pub struct MemoryRepository {
    tables: Arc<Mutex<HashMap<u64, GuildMacros>>>,
    fail_saves: Arc<AtomicBool>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent save fail with a backend error
    pub fn set_failing(&self, failing: bool) {
        self.fail_saves.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of what is currently stored for a guild
    pub fn stored(&self, guild_id: u64) -> Option<GuildMacros> {
        self.tables.lock().unwrap().get(&guild_id).cloned()
    }
}

impl MacroRepository for MemoryRepository {
    async fn load(&self, guild_id: u64) -> Result<Option<GuildMacros>, PersistError> {
        Ok(self.tables.lock().unwrap().get(&guild_id).cloned())
    }

    async fn save(&self, guild_id: u64, table: &GuildMacros) -> Result<(), PersistError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(PersistError::Backend("saves disabled".to_string()));
        }
        self.tables.lock().unwrap().insert(guild_id, table.clone());
        Ok(())
    }

    async fn stored_guilds(&self) -> Result<Vec<u64>, PersistError> {
        Ok(self.tables.lock().unwrap().keys().copied().collect())
    }
}

/// One pretty-printed JSON file per guild under a data directory
pub struct JsonFileRepository {
    dir: PathBuf,
}

impl JsonFileRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn guild_path(&self, guild_id: u64) -> PathBuf {
        self.dir.join(format!("{guild_id}.json"))
    }
}

impl MacroRepository for JsonFileRepository {
    async fn load(&self, guild_id: u64) -> Result<Option<GuildMacros>, PersistError> {
        let path = self.guild_path(guild_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let records: Vec<Macro> = serde_json::from_slice(&bytes)?;
        Ok(Some(GuildMacros::from_records(records)))
    }

    async fn save(&self, guild_id: u64, table: &GuildMacros) -> Result<(), PersistError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let payload = serde_json::to_vec_pretty(&table.records())?;
        // write to a sibling file then rename, so a crash mid-write can
        // never leave a torn table behind
        let tmp = self.dir.join(format!("{guild_id}.json.tmp"));
        tokio::fs::write(&tmp, &payload).await?;
        tokio::fs::rename(&tmp, self.guild_path(guild_id)).await?;
        debug!("Persisted {} macros for guild {}", table.len(), guild_id);
        Ok(())
    }

    async fn stored_guilds(&self) -> Result<Vec<u64>, PersistError> {
        let mut out = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(stem) = name.strip_suffix(".json") {
                if let Ok(id) = stem.parse::<u64>() {
                    out.push(id);
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use myna_types::Macro;

    fn sample_table() -> GuildMacros {
        let mut ping = Macro::new("ping", "pong", None, "fun");
        ping.aliases.insert("p".to_string());
        ping.uses = 3;
        GuildMacros::from_records(vec![ping, Macro::new("rules", "be nice", Some(10), "info")])
    }

    #[tokio::test]
    async fn test_memory_roundtrip() {
        let repo = MemoryRepository::new();
        assert_eq!(repo.load(100).await.unwrap(), None);

        repo.save(100, &sample_table()).await.unwrap();
        let loaded = repo.load(100).await.unwrap().unwrap();
        assert_eq!(loaded, sample_table());
        assert_eq!(repo.stored_guilds().await.unwrap(), vec![100]);
    }

    #[tokio::test]
    async fn test_memory_failure_switch() {
        let repo = MemoryRepository::new();
        repo.set_failing(true);
        let err = repo.save(100, &sample_table()).await.unwrap_err();
        assert!(matches!(err, PersistError::Backend(_)));
        assert_eq!(repo.stored(100), None);

        repo.set_failing(false);
        repo.save(100, &sample_table()).await.unwrap();
        assert!(repo.stored(100).is_some());
    }

    #[tokio::test]
    async fn test_json_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path());

        assert_eq!(repo.load(100).await.unwrap(), None);
        repo.save(100, &sample_table()).await.unwrap();

        let loaded = repo.load(100).await.unwrap().unwrap();
        assert_eq!(loaded, sample_table());

        // counters and aliases survive the trip
        let ping = loaded
            .get(&myna_types::MacroKey::global("ping"))
            .unwrap();
        assert_eq!(ping.uses, 3);
        assert!(ping.aliases.contains("p"));
    }

    #[tokio::test]
    async fn test_json_file_overwrite_and_scan() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path());

        repo.save(100, &sample_table()).await.unwrap();
        repo.save(200, &GuildMacros::new()).await.unwrap();

        let mut guilds = repo.stored_guilds().await.unwrap();
        guilds.sort();
        assert_eq!(guilds, vec![100, 200]);

        // second save replaces the first
        let smaller = GuildMacros::from_records(vec![Macro::new("only", "x", None, "misc")]);
        repo.save(100, &smaller).await.unwrap();
        assert_eq!(repo.load(100).await.unwrap().unwrap(), smaller);
    }

    #[tokio::test]
    async fn test_scan_of_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("never-created"));
        assert!(repo.stored_guilds().await.unwrap().is_empty());
    }
}
