//! The weighted lottery draw.
//!
//! Turns a participant list plus multiplier configuration into a bounded,
//! deduplicated winner list:
//!
//! 1. Build a ticket pool replicating each participant `multiplier` times
//! 2. Partially shuffle a bounded prefix of the pool
//! 3. Walk the shuffled prefix, deduplicating by id, resolving candidates
//!    through the member resolver's layers until the quota is filled
//!
//! The partial shuffle bounds randomization cost at `winners * window
//! factor` positions regardless of pool size, trading a small fairness loss
//! for cost independent of participation.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::directory::{Member, MemberDirectory, MemberResolver, RawUser};
use crate::types::{GiveawayConfig, RoleMultiplier, UserId};

use super::weights::{effective_multiplier, merged_table};

/// Default bound on shuffled positions, as a multiple of the winner quota.
pub const DEFAULT_SHUFFLE_WINDOW_FACTOR: u32 = 5;

/// A drawn winner, ready for announcement.
///
/// Usually a resolved guild member; in the last-resort path a bare user
/// that could not be resolved as a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Winner {
    pub id: UserId,
    pub display_name: String,
}

impl From<Member> for Winner {
    fn from(member: Member) -> Self {
        Winner {
            id: member.id,
            display_name: member.display_name().to_string(),
        }
    }
}

impl From<RawUser> for Winner {
    fn from(user: RawUser) -> Self {
        Winner {
            id: user.id,
            display_name: user.username,
        }
    }
}

/// Weighted-lottery winner selection over an injected member directory.
#[derive(Debug)]
pub struct LotteryEngine<D> {
    resolver: MemberResolver<D>,
    shuffle_window_factor: u32,
}

impl<D: MemberDirectory> LotteryEngine<D> {
    pub fn new(resolver: MemberResolver<D>) -> Self {
        LotteryEngine {
            resolver,
            shuffle_window_factor: DEFAULT_SHUFFLE_WINDOW_FACTOR,
        }
    }

    /// Overrides the shuffle window factor (tests and tuning).
    pub fn with_shuffle_window_factor(mut self, factor: u32) -> Self {
        self.shuffle_window_factor = factor.max(1);
        self
    }

    /// Draws up to `winners_count` unique winners from `participants`.
    ///
    /// Never fails: resolution problems shrink the winner list rather than
    /// erroring, and an empty result is a valid outcome.
    pub async fn pick(
        &self,
        participants: &[UserId],
        winners_count: u32,
        config: Option<&GiveawayConfig>,
        overrides: Option<&[RoleMultiplier]>,
    ) -> Vec<Winner> {
        // StdRng rather than the thread-local RNG: the future stays Send
        // across the shuffle's await points.
        let mut rng = StdRng::from_entropy();
        self.pick_with_rng(&mut rng, participants, winners_count, config, overrides)
            .await
    }

    /// [`LotteryEngine::pick`] with an explicit RNG, so tests are
    /// deterministic.
    pub async fn pick_with_rng<R: Rng>(
        &self,
        rng: &mut R,
        participants: &[UserId],
        winners_count: u32,
        config: Option<&GiveawayConfig>,
        overrides: Option<&[RoleMultiplier]>,
    ) -> Vec<Winner> {
        // A request for zero winners is a caller bug; draw one instead of
        // failing the whole giveaway.
        let quota = if winners_count < 1 {
            warn!(winners_count, "Winner count below 1, coercing to 1");
            1
        } else {
            winners_count
        } as usize;

        if participants.is_empty() {
            return Vec::new();
        }

        let pool = self.build_ticket_pool(participants, config, overrides).await;

        let window = pool.len().min(quota.saturating_mul(self.shuffle_window_factor as usize));
        let mut pool = pool;
        pool.partial_shuffle(rng, window);

        // Dedupe the shuffled prefix by id: the first occurrence wins, later
        // duplicates are the same participant's extra tickets.
        let mut candidates: Vec<UserId> = Vec::with_capacity(window);
        for &id in &pool[..window] {
            if !candidates.contains(&id) {
                candidates.push(id);
            }
        }

        self.resolve_candidates(&candidates, quota).await
    }

    /// Replicates each participant id `multiplier` times.
    ///
    /// Role weights come from the directory's cache layer; a participant
    /// absent from cache weighs the default 1.
    pub(crate) async fn build_ticket_pool(
        &self,
        participants: &[UserId],
        config: Option<&GiveawayConfig>,
        overrides: Option<&[RoleMultiplier]>,
    ) -> Vec<UserId> {
        let table = merged_table(config, overrides);
        if table.is_empty() {
            return participants.to_vec();
        }

        let mut pool = Vec::with_capacity(participants.len());
        for &id in participants {
            let multiplier = match self.resolver.from_cache(id).await {
                Some(member) => effective_multiplier(&member.roles, &table),
                None => super::weights::DEFAULT_MULTIPLIER,
            };
            for _ in 0..multiplier {
                pool.push(id);
            }
        }
        pool
    }

    /// Resolves deduplicated candidates through the directory layers until
    /// the quota is filled or candidates are exhausted.
    async fn resolve_candidates(&self, candidates: &[UserId], quota: usize) -> Vec<Winner> {
        let mut winners: Vec<Winner> = Vec::with_capacity(quota.min(candidates.len()));
        let mut unresolved: Vec<UserId> = Vec::new();

        // Layer 1: cache, stopping as soon as the quota is filled.
        for &id in candidates {
            if winners.len() == quota {
                break;
            }
            match self.resolver.from_cache(id).await {
                Some(member) => winners.push(member.into()),
                None => unresolved.push(id),
            }
        }

        // Layer 2: one bulk fetch for everything the cache missed.
        let mut still_missing: Vec<UserId> = Vec::new();
        if winners.len() < quota && !unresolved.is_empty() {
            let fetched = self.resolver.bulk(&unresolved).await;
            for id in unresolved {
                if winners.len() == quota {
                    break;
                }
                match fetched.get(&id) {
                    Some(member) => winners.push(member.clone().into()),
                    None => still_missing.push(id),
                }
            }
        }

        // Layer 3: individual fetches, already in shuffled order.
        for id in still_missing {
            if winners.len() == quota {
                break;
            }
            if let Some(member) = self.resolver.individual(id).await {
                winners.push(member.into());
            }
        }

        // Layer 4: if nothing at all resolved, try a bare user for the first
        // candidate so the announcement has at least one name to show.
        if winners.is_empty() {
            warn!(
                candidates = candidates.len(),
                "No winners resolved; drawn members may have left the guild, \
                 or the member cache/permissions are missing"
            );
            if let Some(&first) = candidates.first() {
                if let Some(user) = self.resolver.raw_user(first).await {
                    winners.push(user.into());
                }
            }
        }

        debug!(
            drawn = winners.len(),
            quota,
            candidates = candidates.len(),
            "Lottery resolution complete"
        );
        winners
    }
}
