//! JSON-file giveaway store.
//!
//! Persists the whole collection to a single JSON file so claim state
//! survives restarts: a record claimed by a tick that crashed mid-processing
//! comes back as CLAIMED, not SCHEDULED, and is picked up by the stale-claim
//! re-drive rather than silently skipped.
//!
//! # Atomic Writes
//!
//! The collection is written atomically using a write-to-temp-then-rename
//! pattern:
//! 1. Write to `<path>.tmp`
//! 2. fsync the file
//! 3. Rename to `<path>`
//! 4. fsync the directory
//!
//! This ensures that readers always see either the old or new collection,
//! never a partial write. Without the directory fsync, a rename may not
//! survive a power loss even if the file contents were synced.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::types::{GiveawayConfig, GiveawayId, GiveawayRecord, GuildId};

use super::memory::Collection;
use super::{GiveawayStore, Result, StoreError};

/// Current schema version. Increment when making breaking changes.
pub const SCHEMA_VERSION: u32 = 1;

/// The on-disk JSON structure.
#[derive(Debug, Serialize, Deserialize)]
struct CollectionFile {
    /// Schema version for forward-compatible migrations.
    schema_version: u32,

    /// When this file was last written (ISO 8601).
    saved_at: DateTime<Utc>,

    /// All giveaway records, keyed by id.
    records: HashMap<GiveawayId, GiveawayRecord>,

    /// Per-guild multiplier configuration, keyed by guild id.
    configs: HashMap<GuildId, GiveawayConfig>,
}

/// File-backed store: an in-memory collection flushed atomically on every
/// mutation.
///
/// The mutex covers both the mutation and the flush, so the file on disk
/// always reflects a sequence of complete operations. That also preserves
/// the `claim_one` atomicity contract for multiple tasks in one process;
/// multi-process deployments need a store backed by a real database's
/// conditional updates.
#[derive(Debug)]
pub struct JsonStore {
    inner: Mutex<Collection>,
    path: PathBuf,
}

impl JsonStore {
    /// Opens the store, loading `path` if it exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let collection = if path.exists() {
            let bytes = std::fs::read(&path)?;
            let file: CollectionFile = serde_json::from_slice(&bytes)?;
            if file.schema_version != SCHEMA_VERSION {
                return Err(StoreError::SchemaMismatch {
                    expected: SCHEMA_VERSION,
                    got: file.schema_version,
                });
            }
            Collection {
                records: file.records,
                configs: file.configs,
            }
        } else {
            Collection::default()
        };

        Ok(JsonStore {
            inner: Mutex::new(collection),
            path,
        })
    }

    /// Sets the multiplier configuration for a guild and persists.
    pub async fn set_config(&self, guild: GuildId, config: GiveawayConfig) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.configs.insert(guild, config);
        save_atomic(&self.path, &inner)
    }
}

/// Saves a collection atomically to disk (temp file, fsync, rename, dir fsync).
fn save_atomic(path: &Path, collection: &Collection) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let file = CollectionFile {
        schema_version: SCHEMA_VERSION,
        saved_at: Utc::now(),
        records: collection.records.clone(),
        configs: collection.configs.clone(),
    };
    let bytes = serde_json::to_vec_pretty(&file)?;

    let tmp_path = path.with_extension("json.tmp");
    {
        let mut tmp = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)?;
        tmp.write_all(&bytes)?;
        fsync_file(&tmp)?;
    }

    std::fs::rename(&tmp_path, path)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fsync_dir(parent)?;
    }

    Ok(())
}

/// Syncs a file's contents and metadata to disk (`fsync(2)`).
fn fsync_file(file: &File) -> std::io::Result<()> {
    file.sync_all()
}

/// Syncs a directory to disk, ensuring the rename's directory entry is
/// durable.
fn fsync_dir(dir_path: &Path) -> std::io::Result<()> {
    let dir = OpenOptions::new().read(true).open(dir_path)?;
    dir.sync_all()
}

impl GiveawayStore for JsonStore {
    async fn claim_one(
        &self,
        now: DateTime<Utc>,
        reclaim_after: Duration,
    ) -> Result<Option<GiveawayRecord>> {
        let mut inner = self.inner.lock().await;
        let claimed = inner.claim_one(now, reclaim_after);
        if claimed.is_some() {
            save_atomic(&self.path, &inner)?;
        }
        Ok(claimed)
    }

    async fn finalize(&self, id: &GiveawayId) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        let transitioned = inner.finalize(id)?;
        if transitioned {
            save_atomic(&self.path, &inner)?;
        }
        Ok(transitioned)
    }

    async fn get_config(&self, guild: GuildId) -> Result<Option<GiveawayConfig>> {
        Ok(self.inner.lock().await.configs.get(&guild).cloned())
    }

    async fn count_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        Ok(self.inner.lock().await.count_expired(now))
    }

    async fn insert(&self, record: GiveawayRecord) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.records.insert(record.id.clone(), record);
        save_atomic(&self.path, &inner)
    }

    async fn get(&self, id: &GiveawayId) -> Result<Option<GiveawayRecord>> {
        Ok(self.inner.lock().await.records.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChannelId, MessageId, UserId};
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn grace() -> Duration {
        Duration::minutes(15)
    }

    fn record(id: &str) -> (GiveawayRecord, DateTime<Utc>) {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let rec = GiveawayRecord::new(
            id,
            GuildId(1),
            ChannelId(2),
            MessageId(3),
            "prize",
            UserId(4),
            1,
            now - Duration::minutes(1),
        );
        (rec, now)
    }

    #[tokio::test]
    async fn open_on_missing_file_starts_empty() {
        let dir = tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("giveaways.json")).unwrap();
        let (_, now) = record("gw");
        assert_eq!(store.count_expired(now).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("giveaways.json");
        let (rec, _) = record("gw");

        {
            let store = JsonStore::open(&path).unwrap();
            store.insert(rec.clone()).await.unwrap();
        }

        let store = JsonStore::open(&path).unwrap();
        assert_eq!(store.get(&rec.id).await.unwrap(), Some(rec));
    }

    #[tokio::test]
    async fn claim_state_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("giveaways.json");
        let (rec, now) = record("gw");
        let id = rec.id.clone();

        {
            let store = JsonStore::open(&path).unwrap();
            store.insert(rec).await.unwrap();
            store.claim_one(now, grace()).await.unwrap().unwrap();
        }

        // The restarted process sees the record as CLAIMED, not SCHEDULED:
        // it is not re-claimable until the grace period expires.
        let store = JsonStore::open(&path).unwrap();
        let loaded = store.get(&id).await.unwrap().unwrap();
        assert!(!loaded.active);
        assert!(!loaded.finalized);
        assert!(store.claim_one(now, grace()).await.unwrap().is_none());
        assert!(store.claim_one(now + grace(), grace()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn finalize_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("giveaways.json");
        let (rec, _) = record("gw");
        let id = rec.id.clone();

        {
            let store = JsonStore::open(&path).unwrap();
            store.insert(rec).await.unwrap();
            assert!(store.finalize(&id).await.unwrap());
        }

        let store = JsonStore::open(&path).unwrap();
        assert!(!store.finalize(&id).await.unwrap());
    }

    #[tokio::test]
    async fn config_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("giveaways.json");
        let config = GiveawayConfig {
            enabled: true,
            role_multipliers: Vec::new(),
        };

        {
            let store = JsonStore::open(&path).unwrap();
            store.set_config(GuildId(9), config.clone()).await.unwrap();
        }

        let store = JsonStore::open(&path).unwrap();
        assert_eq!(store.get_config(GuildId(9)).await.unwrap(), Some(config));
    }

    #[tokio::test]
    async fn schema_mismatch_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("giveaways.json");
        std::fs::write(
            &path,
            r#"{"schema_version": 99, "saved_at": "2025-06-01T12:00:00Z", "records": {}, "configs": {}}"#,
        )
        .unwrap();

        match JsonStore::open(&path) {
            Err(StoreError::SchemaMismatch { expected, got }) => {
                assert_eq!(expected, SCHEMA_VERSION);
                assert_eq!(got, 99);
            }
            other => panic!("expected schema mismatch, got {other:?}"),
        }
    }
}
