//! Core domain types for the giveaway scheduler.
//!
//! This module contains the persisted data model (records, per-guild config)
//! and the newtype identifiers shared by every other module.

pub mod giveaway;
pub mod ids;

// Re-export commonly used types
pub use giveaway::{GiveawayConfig, GiveawayRecord, GiveawayStatus, RoleMultiplier};
pub use ids::{ChannelId, GiveawayId, GuildId, MessageId, RoleId, UserId};
