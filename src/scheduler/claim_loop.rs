//! The claim loop: discover, claim, process, finalize.
//!
//! Each tick drains every expired giveaway: claim one record atomically,
//! drive it through lottery → delivery → finalize, claim the next. The
//! store's conditional claim is the only concurrency-safety mechanism —
//! ticks may overlap (a slow tick can still be running when the next fires)
//! and multiple scheduler instances may share one store, and each record is
//! still observed by exactly one execution.
//!
//! # Failure Containment
//!
//! Three nested layers, from the inside out:
//! - per candidate: member-resolution failures shrink the winner list
//! - per record: processing failures are logged and the loop claims the
//!   next record; unresolvable guilds/channels force-finalize so the record
//!   cannot be reclaimed every tick forever
//! - per tick: a store failure aborts the tick, is logged by the run loop,
//!   and the next cadence retries

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::delivery::ResultDeliveryPipeline;
use crate::directory::MemberResolver;
use crate::lottery::LotteryEngine;
use crate::platform::ChatPlatform;
use crate::store::{GiveawayStore, StoreError};
use crate::types::{GiveawayId, GiveawayRecord};

use super::config::SchedulerConfig;

/// What one tick accomplished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Eligible records counted before claiming began (drift diagnostic;
    /// `None` if the snapshot query failed).
    pub expired_before: Option<u64>,

    /// Records claimed this tick.
    pub claimed: u32,

    /// Records whose finalize write succeeded (or had already happened).
    pub finalized: u32,

    /// Records force-finalized because their guild/channel was unresolvable.
    pub forced: u32,

    /// Records left CLAIMED because the finalize write failed. These are
    /// re-driven after the reclaim grace period.
    pub finalize_failures: u32,
}

/// Outcome of processing one claimed record.
struct RecordOutcome {
    forced: bool,
    finalized: bool,
}

/// The scheduler: claims expired giveaways and drives them to FINALIZED.
#[derive(Debug)]
pub struct ClaimLoop<S, P> {
    store: S,
    platform: P,
    config: SchedulerConfig,
}

impl<S: GiveawayStore, P: ChatPlatform> ClaimLoop<S, P> {
    pub fn new(store: S, platform: P) -> Self {
        ClaimLoop {
            store,
            platform,
            config: SchedulerConfig::default(),
        }
    }

    /// Replaces the default configuration.
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs ticks on the configured cadence until `shutdown` is cancelled.
    ///
    /// A failed tick is logged and retried on the next cadence; the loop
    /// itself never dies.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.config.tick_interval.as_secs(),
            "Claim loop started"
        );
        let mut interval = tokio::time::interval(self.config.tick_interval);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown signal received, stopping claim loop");
                    break;
                }
                _ = interval.tick() => {
                    match self.tick(Utc::now()).await {
                        Ok(stats) if stats.claimed > 0 => {
                            info!(
                                claimed = stats.claimed,
                                finalized = stats.finalized,
                                forced = stats.forced,
                                finalize_failures = stats.finalize_failures,
                                "Tick complete"
                            );
                        }
                        Ok(_) => {}
                        Err(e) => {
                            error!(error = %e, "Tick failed, retrying next cadence");
                        }
                    }
                }
            }
        }
    }

    /// One tick: claim and process expired records until none remain.
    ///
    /// Tests call this directly with an explicit `now` instead of waiting
    /// on real timers.
    #[instrument(skip(self, now))]
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<TickStats, StoreError> {
        let mut stats = TickStats::default();

        // Drift diagnostic only; the claim below is what decides eligibility.
        match self.store.count_expired(now).await {
            Ok(count) => {
                stats.expired_before = Some(count);
                if count > 0 {
                    debug!(expired = count, "Tick starting with expired giveaways");
                }
            }
            Err(e) => warn!(error = %e, "Failed to snapshot expired count"),
        }

        loop {
            let record = match self
                .store
                .claim_one(now, self.config.reclaim_after)
                .await?
            {
                Some(record) => record,
                None => break,
            };
            stats.claimed += 1;
            info!(
                giveaway = %record.id,
                guild = %record.guild_id,
                participants = record.participants.len(),
                "Claimed expired giveaway"
            );

            let outcome = self.process_record(&record).await;
            if outcome.forced {
                stats.forced += 1;
            }
            if outcome.finalized {
                stats.finalized += 1;
            } else {
                stats.finalize_failures += 1;
            }
        }

        Ok(stats)
    }

    /// Drives one claimed record through lottery → delivery → finalize.
    ///
    /// Never propagates: every failure is logged here so one record cannot
    /// stop the tick from claiming the next.
    async fn process_record(&self, record: &GiveawayRecord) -> RecordOutcome {
        let config = match self.store.get_config(record.guild_id).await {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    giveaway = %record.id,
                    guild = %record.guild_id,
                    error = %e,
                    "Failed to read guild config, proceeding with default weights"
                );
                None
            }
        };

        let directory = match self.platform.guild_directory(record.guild_id).await {
            Ok(directory) => directory,
            Err(e) => {
                warn!(
                    giveaway = %record.id,
                    guild = %record.guild_id,
                    error = %e,
                    "Guild unresolvable, forcing finalize"
                );
                return RecordOutcome {
                    forced: true,
                    finalized: self.force_finalize(&record.id).await,
                };
            }
        };

        let channel = match self
            .platform
            .open_channel(record.guild_id, record.channel_id)
            .await
        {
            Ok(channel) => channel,
            Err(e) => {
                warn!(
                    giveaway = %record.id,
                    channel = %record.channel_id,
                    error = %e,
                    "Channel unresolvable, forcing finalize"
                );
                return RecordOutcome {
                    forced: true,
                    finalized: self.force_finalize(&record.id).await,
                };
            }
        };

        let engine = LotteryEngine::new(MemberResolver::new(directory))
            .with_shuffle_window_factor(self.config.shuffle_window_factor);
        let winners = engine
            .pick(
                &record.participants,
                record.winners_count,
                config.as_ref(),
                None,
            )
            .await;

        let delivery = ResultDeliveryPipeline::new(channel)
            .deliver(record, &winners)
            .await;
        debug!(
            giveaway = %record.id,
            winners = winners.len(),
            edited = delivery.edited,
            announcement = ?delivery.announcement,
            "Delivery attempted"
        );

        let finalized = match self.store.finalize(&record.id).await {
            Ok(true) => {
                info!(giveaway = %record.id, winners = winners.len(), "Giveaway finalized");
                true
            }
            Ok(false) => {
                debug!(giveaway = %record.id, "Already finalized by a concurrent processor");
                true
            }
            Err(e) => {
                error!(
                    giveaway = %record.id,
                    error = %e,
                    "Finalize write failed; record will be re-driven after the reclaim grace"
                );
                false
            }
        };

        RecordOutcome {
            forced: false,
            finalized,
        }
    }

    /// Finalizes without delivery so an unprocessable record cannot be
    /// reclaimed every tick forever. The record is kept (not deleted) to
    /// preserve audit history.
    async fn force_finalize(&self, id: &GiveawayId) -> bool {
        match self.store.finalize(id).await {
            Ok(_) => true,
            Err(e) => {
                error!(giveaway = %id, error = %e, "Forced finalize failed");
                false
            }
        }
    }
}
