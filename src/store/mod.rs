//! Typed access to the persisted giveaway collection.
//!
//! The store owns the only shared mutable resource in the system. Its
//! [`GiveawayStore::claim_one`] conditional update is the sole concurrency
//! safety mechanism of the scheduler: out of any number of concurrent or
//! overlapping tick executions, exactly one observes a given record.
//!
//! Two implementations are provided:
//! - [`MemoryStore`] — in-process, used by tests and as the inner state of
//!   the file-backed store
//! - [`JsonStore`] — JSON file with atomic write-to-temp-then-rename
//!   persistence, so claim state survives restarts

pub mod json;
pub mod memory;

use std::future::Future;
use std::io;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::types::{GiveawayConfig, GiveawayId, GiveawayRecord, GuildId};

pub use json::JsonStore;
pub use memory::MemoryStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Schema version mismatch when loading a collection file.
    #[error("schema version mismatch: expected {expected}, got {got}")]
    SchemaMismatch { expected: u32, got: u32 },

    /// The referenced giveaway does not exist.
    #[error("no such giveaway: {0}")]
    NotFound(GiveawayId),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Typed access to giveaway records and per-guild multiplier configuration.
///
/// All operations are conditional updates or reads against one collection.
/// Implementations must make `claim_one` atomic with respect to concurrent
/// callers; nothing else in the scheduler provides mutual exclusion.
pub trait GiveawayStore: Send + Sync {
    /// Atomically claims one expired record, or returns `None` if nothing is
    /// eligible.
    ///
    /// The claim predicate is:
    ///
    /// ```text
    /// finalized = false AND end_time <= now
    ///   AND (active = true OR claimed_at older than reclaim_after)
    /// ```
    ///
    /// ordered oldest `end_time` first. Claiming sets `active = false` and
    /// stamps `claimed_at = now`, and returns the post-update record.
    ///
    /// Requiring `active = true` makes the claim exclusive: concurrent
    /// callers racing for one record see exactly one `Some`. The
    /// `reclaim_after` arm re-drives records whose tick claimed them but
    /// never finalized (crash, failed finalize write); that path is
    /// deliberately at-least-once.
    fn claim_one(
        &self,
        now: DateTime<Utc>,
        reclaim_after: Duration,
    ) -> impl Future<Output = Result<Option<GiveawayRecord>>> + Send;

    /// Marks a record finalized, requiring `finalized = false`.
    ///
    /// Returns `false` if the record was already finalized (idempotent
    /// guard: the second caller is told it lost, and must not act further).
    fn finalize(&self, id: &GiveawayId) -> impl Future<Output = Result<bool>> + Send;

    /// Reads the per-guild multiplier configuration, if any.
    fn get_config(
        &self,
        guild: GuildId,
    ) -> impl Future<Output = Result<Option<GiveawayConfig>>> + Send;

    /// Counts records matching `finalized = false AND end_time <= now`.
    ///
    /// Diagnostics only (tick drift logging); does not affect correctness.
    fn count_expired(&self, now: DateTime<Utc>) -> impl Future<Output = Result<u64>> + Send;

    /// Inserts or replaces a record. Used by the creation command layer and
    /// by tests; the scheduler itself never inserts.
    fn insert(&self, record: GiveawayRecord) -> impl Future<Output = Result<()>> + Send;

    /// Reads a record by id.
    fn get(&self, id: &GiveawayId) -> impl Future<Output = Result<Option<GiveawayRecord>>> + Send;
}

/// Stores are commonly shared between the scheduler and the command layer.
impl<T: GiveawayStore> GiveawayStore for std::sync::Arc<T> {
    async fn claim_one(
        &self,
        now: DateTime<Utc>,
        reclaim_after: Duration,
    ) -> Result<Option<GiveawayRecord>> {
        (**self).claim_one(now, reclaim_after).await
    }

    async fn finalize(&self, id: &GiveawayId) -> Result<bool> {
        (**self).finalize(id).await
    }

    async fn get_config(&self, guild: GuildId) -> Result<Option<GiveawayConfig>> {
        (**self).get_config(guild).await
    }

    async fn count_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        (**self).count_expired(now).await
    }

    async fn insert(&self, record: GiveawayRecord) -> Result<()> {
        (**self).insert(record).await
    }

    async fn get(&self, id: &GiveawayId) -> Result<Option<GiveawayRecord>> {
        (**self).get(id).await
    }
}
