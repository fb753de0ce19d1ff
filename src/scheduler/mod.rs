//! The giveaway lifecycle scheduler.
//!
//! This module implements the periodic claim-and-process loop that drives
//! expired giveaways through the state machine:
//!
//! ```text
//! SCHEDULED ──claim──▶ CLAIMED ──finalize──▶ FINALIZED
//!                         │                      ▲
//!                         └──forced finalize─────┘   (guild/channel missing)
//! ```
//!
//! # Key Invariants
//!
//! 1. **Exactly-one claim**: the store's atomic conditional update is the
//!    sole concurrency-safety mechanism; no scheduler-level locking exists
//!    or is needed, even across overlapping ticks or multiple instances.
//!
//! 2. **Finalize is terminal and idempotent**: the conditional update
//!    requires `finalized = false`; a second attempt is a no-op.
//!
//! 3. **Delivery never blocks finalization**: message failures are logged
//!    and folded into the outcome; only store failures can leave a record
//!    CLAIMED, and the stale-claim grace re-drives those.

pub mod claim_loop;
pub mod config;

// Re-export commonly used types
pub use claim_loop::{ClaimLoop, TickStats};
pub use config::SchedulerConfig;
