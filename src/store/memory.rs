//! In-memory giveaway store.
//!
//! A mutex-serialized map that implements the same conditional-update
//! semantics as the file-backed store. The mutex makes each operation a
//! single atomic step, which is exactly the contract `claim_one` needs.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use crate::types::{GiveawayConfig, GiveawayId, GiveawayRecord, GuildId};

use super::{GiveawayStore, Result, StoreError};

/// Collection state shared by the in-memory and file-backed stores.
#[derive(Debug, Default, Clone)]
pub(crate) struct Collection {
    pub(crate) records: HashMap<GiveawayId, GiveawayRecord>,
    pub(crate) configs: HashMap<GuildId, GiveawayConfig>,
}

impl Collection {
    /// Finds the oldest eligible record and claims it in place.
    ///
    /// This is the one mutation that must be atomic; both store
    /// implementations call it under their lock.
    pub(crate) fn claim_one(
        &mut self,
        now: DateTime<Utc>,
        reclaim_after: Duration,
    ) -> Option<GiveawayRecord> {
        let id = self
            .records
            .values()
            .filter(|r| {
                !r.finalized
                    && r.is_expired(now)
                    && (r.active || r.is_stale_claim(now, reclaim_after))
            })
            // Tie-break on id so claim order is deterministic when several
            // records share an end_time.
            .min_by_key(|r| (r.end_time, r.id.clone()))
            .map(|r| r.id.clone())?;

        // The id came from the same map under the same lock.
        let record = self.records.get_mut(&id)?;
        record.active = false;
        record.claimed_at = Some(now);
        Some(record.clone())
    }

    pub(crate) fn finalize(&mut self, id: &GiveawayId) -> Result<bool> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if record.finalized {
            return Ok(false);
        }
        record.finalized = true;
        Ok(true)
    }

    pub(crate) fn count_expired(&self, now: DateTime<Utc>) -> u64 {
        self.records
            .values()
            .filter(|r| !r.finalized && r.is_expired(now))
            .count() as u64
    }
}

/// In-process store, used by tests and as the state of [`super::JsonStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Collection>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Sets the multiplier configuration for a guild.
    ///
    /// Config is owned by the admin command layer; this exists for wiring
    /// and tests.
    pub async fn set_config(&self, guild: GuildId, config: GiveawayConfig) {
        self.inner.lock().await.configs.insert(guild, config);
    }
}

impl GiveawayStore for MemoryStore {
    async fn claim_one(
        &self,
        now: DateTime<Utc>,
        reclaim_after: Duration,
    ) -> Result<Option<GiveawayRecord>> {
        Ok(self.inner.lock().await.claim_one(now, reclaim_after))
    }

    async fn finalize(&self, id: &GiveawayId) -> Result<bool> {
        self.inner.lock().await.finalize(id)
    }

    async fn get_config(&self, guild: GuildId) -> Result<Option<GiveawayConfig>> {
        Ok(self.inner.lock().await.configs.get(&guild).cloned())
    }

    async fn count_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        Ok(self.inner.lock().await.count_expired(now))
    }

    async fn insert(&self, record: GiveawayRecord) -> Result<()> {
        self.inner
            .lock()
            .await
            .records
            .insert(record.id.clone(), record);
        Ok(())
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
    use std::sync::Arc;

    fn expired_record(id: &str, end_offset_secs: i64) -> (GiveawayRecord, DateTime<Utc>) {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let rec = GiveawayRecord::new(
            id,
            GuildId(1),
            ChannelId(2),
            MessageId(3),
            "prize",
            UserId(4),
            1,
            now + Duration::seconds(end_offset_secs),
        );
        (rec, now)
    }

    fn grace() -> Duration {
        Duration::minutes(15)
    }

    mod claim {
        use super::*;

        #[tokio::test]
        async fn claims_expired_record_and_stamps_it() {
            let store = MemoryStore::new();
            let (rec, now) = expired_record("gw", -10);
            store.insert(rec).await.unwrap();

            let claimed = store.claim_one(now, grace()).await.unwrap().unwrap();
            assert!(!claimed.active);
            assert!(!claimed.finalized);
            assert_eq!(claimed.claimed_at, Some(now));
        }

        #[tokio::test]
        async fn ignores_unexpired_records() {
            let store = MemoryStore::new();
            let (rec, now) = expired_record("gw", 10);
            store.insert(rec).await.unwrap();

            assert!(store.claim_one(now, grace()).await.unwrap().is_none());
        }

        #[tokio::test]
        async fn second_claim_returns_none() {
            let store = MemoryStore::new();
            let (rec, now) = expired_record("gw", -10);
            store.insert(rec).await.unwrap();

            assert!(store.claim_one(now, grace()).await.unwrap().is_some());
            assert!(store.claim_one(now, grace()).await.unwrap().is_none());
        }

        #[tokio::test]
        async fn oldest_end_time_claimed_first() {
            let store = MemoryStore::new();
            let (newer, now) = expired_record("newer", -10);
            let (older, _) = expired_record("older", -60);
            store.insert(newer).await.unwrap();
            store.insert(older).await.unwrap();

            let first = store.claim_one(now, grace()).await.unwrap().unwrap();
            assert_eq!(first.id.as_str(), "older");
            let second = store.claim_one(now, grace()).await.unwrap().unwrap();
            assert_eq!(second.id.as_str(), "newer");
        }

        #[tokio::test]
        async fn concurrent_claims_yield_exactly_one_record() {
            let store = Arc::new(MemoryStore::new());
            let (rec, now) = expired_record("gw", -10);
            store.insert(rec).await.unwrap();

            let mut handles = Vec::new();
            for _ in 0..16 {
                let store = Arc::clone(&store);
                handles.push(tokio::spawn(async move {
                    store.claim_one(now, grace()).await.unwrap()
                }));
            }

            let mut claimed = 0;
            for handle in handles {
                if handle.await.unwrap().is_some() {
                    claimed += 1;
                }
            }
            assert_eq!(claimed, 1);
        }

        #[tokio::test]
        async fn stale_claim_is_reclaimable_after_grace() {
            let store = MemoryStore::new();
            let (rec, now) = expired_record("gw", -10);
            store.insert(rec).await.unwrap();

            assert!(store.claim_one(now, grace()).await.unwrap().is_some());

            // Within the grace period the claimed record is invisible.
            let soon = now + Duration::minutes(5);
            assert!(store.claim_one(soon, grace()).await.unwrap().is_none());

            // After the grace period it is re-driven.
            let later = now + grace();
            let reclaimed = store.claim_one(later, grace()).await.unwrap().unwrap();
            assert_eq!(reclaimed.claimed_at, Some(later));
        }

        #[tokio::test]
        async fn finalized_record_is_never_reclaimed() {
            let store = MemoryStore::new();
            let (rec, now) = expired_record("gw", -10);
            let id = rec.id.clone();
            store.insert(rec).await.unwrap();

            store.claim_one(now, grace()).await.unwrap().unwrap();
            assert!(store.finalize(&id).await.unwrap());

            let much_later = now + Duration::days(1);
            assert!(store.claim_one(much_later, grace()).await.unwrap().is_none());
        }
    }

    mod finalize {
        use super::*;

        #[tokio::test]
        async fn first_finalize_returns_true_second_false() {
            let store = MemoryStore::new();
            let (rec, _) = expired_record("gw", -10);
            let id = rec.id.clone();
            store.insert(rec).await.unwrap();

            assert!(store.finalize(&id).await.unwrap());
            assert!(!store.finalize(&id).await.unwrap());
        }

        #[tokio::test]
        async fn finalize_missing_record_is_an_error() {
            let store = MemoryStore::new();
            let result = store.finalize(&GiveawayId::new("missing")).await;
            assert!(matches!(result, Err(StoreError::NotFound(_))));
        }
    }

    mod queries {
        use super::*;

        #[tokio::test]
        async fn count_expired_counts_unfinalized_only() {
            let store = MemoryStore::new();
            let (expired, now) = expired_record("a", -10);
            let (pending, _) = expired_record("b", 10);
            let (done, _) = expired_record("c", -20);
            let done_id = done.id.clone();
            store.insert(expired).await.unwrap();
            store.insert(pending).await.unwrap();
            store.insert(done).await.unwrap();
            store.finalize(&done_id).await.unwrap();

            assert_eq!(store.count_expired(now).await.unwrap(), 1);
        }

        #[tokio::test]
        async fn get_config_returns_what_was_set() {
            let store = MemoryStore::new();
            assert!(store.get_config(GuildId(1)).await.unwrap().is_none());

            let config = GiveawayConfig {
                enabled: true,
                role_multipliers: Vec::new(),
            };
            store.set_config(GuildId(1), config.clone()).await;
            assert_eq!(store.get_config(GuildId(1)).await.unwrap(), Some(config));
        }
    }
}
