//! The persisted giveaway record and its lifecycle status.
//!
//! A record moves through three states:
//!
//! ```text
//! SCHEDULED (active=true,  finalized=false)
//!     │  atomic claim (scheduler tick)
//!     ▼
//! CLAIMED   (active=false, finalized=false)
//!     │  finalize after delivery, or forced finalize on unrecoverable error
//!     ▼
//! FINALIZED (finalized=true)                    terminal
//! ```
//!
//! The two persisted flags are the source of truth; [`GiveawayStatus`] is a
//! projection over them so callers reason about one explicit state instead of
//! flag combinations. `finalized` transitions false→true at most once and
//! `active` transitions true→false at most once, only via the store's atomic
//! claim.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ChannelId, GiveawayId, GuildId, MessageId, RoleId, UserId};

/// The lifecycle state of a giveaway record, projected from its flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GiveawayStatus {
    /// Running and accepting opt-ins; not yet claimed by a scheduler tick.
    Scheduled,

    /// Claimed by a tick; processing is in flight (or was interrupted).
    Claimed,

    /// All processing complete. Terminal: the record is never mutated again.
    Finalized,
}

impl GiveawayStatus {
    /// Returns a short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            GiveawayStatus::Scheduled => "scheduled",
            GiveawayStatus::Claimed => "claimed",
            GiveawayStatus::Finalized => "finalized",
        }
    }
}

/// One timed promotional event.
///
/// Created by the creation command with `active=true, finalized=false`;
/// participants are mutated only by the opt-in command. The scheduler owns
/// the claim and finalize transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiveawayRecord {
    /// Opaque stable identifier.
    pub id: GiveawayId,

    /// Guild the giveaway runs in.
    pub guild_id: GuildId,

    /// Channel holding the announcement message.
    pub channel_id: ChannelId,

    /// The announcement message to edit and reply to.
    pub message_id: MessageId,

    /// The prize text.
    pub prize: String,

    /// Optional free-form description.
    #[serde(default)]
    pub description: Option<String>,

    /// The user hosting the giveaway.
    pub host_id: UserId,

    /// How many winners to draw (always >= 1; the lottery coerces smaller
    /// values rather than failing).
    pub winners_count: u32,

    /// Instant after which the giveaway is eligible for claim.
    pub end_time: DateTime<Utc>,

    /// Opted-in users. Set semantics: [`GiveawayRecord::enter`] deduplicates.
    #[serde(default)]
    pub participants: Vec<UserId>,

    /// Cleared by the atomic claim. True while the giveaway is running.
    #[serde(default = "default_active")]
    pub active: bool,

    /// Terminal flag. Once true the record must never be mutated again.
    #[serde(default)]
    pub finalized: bool,

    /// When the atomic claim happened, if it has. Used to detect records
    /// stuck between CLAIMED and FINALIZED (e.g., a failed finalize write).
    #[serde(default)]
    pub claimed_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl GiveawayRecord {
    /// Creates a fresh SCHEDULED record.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<GiveawayId>,
        guild_id: GuildId,
        channel_id: ChannelId,
        message_id: MessageId,
        prize: impl Into<String>,
        host_id: UserId,
        winners_count: u32,
        end_time: DateTime<Utc>,
    ) -> Self {
        GiveawayRecord {
            id: id.into(),
            guild_id,
            channel_id,
            message_id,
            prize: prize.into(),
            description: None,
            host_id,
            winners_count,
            end_time,
            participants: Vec::new(),
            active: true,
            finalized: false,
            claimed_at: None,
        }
    }

    /// Returns the explicit lifecycle state for this record's flags.
    pub fn status(&self) -> GiveawayStatus {
        if self.finalized {
            GiveawayStatus::Finalized
        } else if !self.active {
            GiveawayStatus::Claimed
        } else {
            GiveawayStatus::Scheduled
        }
    }

    /// Returns true if the giveaway's end time has passed.
    ///
    /// Boundary: a record ending exactly at `now` is expired (the claim
    /// predicate is `end_time <= now`).
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.end_time <= now
    }

    /// Returns true if this record is CLAIMED but the claim is older than
    /// `grace`. Such records were claimed by a tick that never finalized
    /// (crash, failed finalize write) and are eligible for re-drive.
    pub fn is_stale_claim(&self, now: DateTime<Utc>, grace: Duration) -> bool {
        if self.status() != GiveawayStatus::Claimed {
            return false;
        }
        match self.claimed_at {
            Some(at) => now - at >= grace,
            // Claimed with no timestamp (legacy data): treat as stale so it
            // cannot wedge forever.
            None => true,
        }
    }

    /// Adds a participant, preserving set semantics.
    ///
    /// Returns false if the user had already opted in.
    pub fn enter(&mut self, user: UserId) -> bool {
        if self.participants.contains(&user) {
            return false;
        }
        self.participants.push(user);
        true
    }
}

/// Per-guild giveaway configuration, read-only input to the lottery.
///
/// Not owned or mutated by the scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiveawayConfig {
    /// Whether role multipliers apply in this guild.
    #[serde(default)]
    pub enabled: bool,

    /// Ordered `{role, multiplier}` pairs.
    #[serde(default)]
    pub role_multipliers: Vec<RoleMultiplier>,
}

/// One role-based weight entry.
///
/// Multipliers are integers: a participant holding this role contributes
/// `multiplier` tickets. Fractional weights are not supported by the
/// replication scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMultiplier {
    /// The weighted role.
    pub role: RoleId,

    /// Ticket count for holders of the role.
    pub multiplier: u32,
}

impl RoleMultiplier {
    pub fn new(role: RoleId, multiplier: u32) -> Self {
        RoleMultiplier { role, multiplier }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> GiveawayRecord {
        GiveawayRecord::new(
            "gw-1",
            GuildId(10),
            ChannelId(20),
            MessageId(30),
            "A prize",
            UserId(40),
            1,
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        )
    }

    mod status {
        use super::*;

        #[test]
        fn fresh_record_is_scheduled() {
            assert_eq!(record().status(), GiveawayStatus::Scheduled);
        }

        #[test]
        fn claimed_record_is_claimed() {
            let mut rec = record();
            rec.active = false;
            assert_eq!(rec.status(), GiveawayStatus::Claimed);
        }

        #[test]
        fn finalized_wins_over_active_flag() {
            // A forced finalize can leave active=false, finalized=true;
            // a direct finalize on legacy data could leave active=true.
            // Either way the record is terminal.
            let mut rec = record();
            rec.finalized = true;
            assert_eq!(rec.status(), GiveawayStatus::Finalized);

            rec.active = false;
            assert_eq!(rec.status(), GiveawayStatus::Finalized);
        }

        #[test]
        fn status_names() {
            assert_eq!(GiveawayStatus::Scheduled.name(), "scheduled");
            assert_eq!(GiveawayStatus::Claimed.name(), "claimed");
            assert_eq!(GiveawayStatus::Finalized.name(), "finalized");
        }
    }

    mod expiry {
        use super::*;

        #[test]
        fn end_time_in_future_is_not_expired() {
            let rec = record();
            let before = rec.end_time - Duration::seconds(1);
            assert!(!rec.is_expired(before));
        }

        #[test]
        fn end_time_exactly_now_is_expired() {
            let rec = record();
            assert!(rec.is_expired(rec.end_time));
        }

        #[test]
        fn end_time_in_past_is_expired() {
            let rec = record();
            let after = rec.end_time + Duration::seconds(1);
            assert!(rec.is_expired(after));
        }
    }

    mod stale_claim {
        use super::*;

        #[test]
        fn scheduled_record_is_never_stale() {
            let rec = record();
            let later = rec.end_time + Duration::hours(1);
            assert!(!rec.is_stale_claim(later, Duration::minutes(15)));
        }

        #[test]
        fn fresh_claim_is_not_stale() {
            let mut rec = record();
            rec.active = false;
            rec.claimed_at = Some(rec.end_time);
            let now = rec.end_time + Duration::minutes(5);
            assert!(!rec.is_stale_claim(now, Duration::minutes(15)));
        }

        #[test]
        fn old_claim_is_stale() {
            let mut rec = record();
            rec.active = false;
            rec.claimed_at = Some(rec.end_time);
            let now = rec.end_time + Duration::minutes(15);
            assert!(rec.is_stale_claim(now, Duration::minutes(15)));
        }

        #[test]
        fn claimed_without_timestamp_is_stale() {
            let mut rec = record();
            rec.active = false;
            rec.claimed_at = None;
            assert!(rec.is_stale_claim(rec.end_time, Duration::minutes(15)));
        }

        #[test]
        fn finalized_record_is_never_stale() {
            let mut rec = record();
            rec.active = false;
            rec.finalized = true;
            rec.claimed_at = None;
            assert!(!rec.is_stale_claim(rec.end_time, Duration::minutes(15)));
        }
    }

    mod participants {
        use super::*;

        #[test]
        fn enter_deduplicates() {
            let mut rec = record();
            assert!(rec.enter(UserId(1)));
            assert!(rec.enter(UserId(2)));
            assert!(!rec.enter(UserId(1)));
            assert_eq!(rec.participants, vec![UserId(1), UserId(2)]);
        }
    }

    mod serde_format {
        use super::*;

        #[test]
        fn roundtrip() {
            let mut rec = record();
            rec.description = Some("desc".into());
            rec.enter(UserId(1));
            let json = serde_json::to_string(&rec).unwrap();
            let parsed: GiveawayRecord = serde_json::from_str(&json).unwrap();
            assert_eq!(rec, parsed);
        }

        #[test]
        fn missing_flags_default_to_scheduled() {
            // Records written before the claimed_at field existed must load
            // as SCHEDULED with no claim timestamp.
            let json = r#"{
                "id": "gw-legacy",
                "guild_id": 1,
                "channel_id": 2,
                "message_id": 3,
                "prize": "p",
                "host_id": 4,
                "winners_count": 1,
                "end_time": "2025-06-01T12:00:00Z"
            }"#;
            let parsed: GiveawayRecord = serde_json::from_str(json).unwrap();
            assert_eq!(parsed.status(), GiveawayStatus::Scheduled);
            assert!(parsed.participants.is_empty());
            assert!(parsed.claimed_at.is_none());
        }

        #[test]
        fn config_roundtrip() {
            let config = GiveawayConfig {
                enabled: true,
                role_multipliers: vec![
                    RoleMultiplier::new(RoleId(1), 2),
                    RoleMultiplier::new(RoleId(2), 5),
                ],
            };
            let json = serde_json::to_string(&config).unwrap();
            let parsed: GiveawayConfig = serde_json::from_str(&json).unwrap();
            assert_eq!(config, parsed);
        }
    }
}
