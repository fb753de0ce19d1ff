//! The two-step result delivery pipeline.
//!
//! Step 1 edits the original announcement in place (replacing its embed and
//! clearing interactive components, which closes opt-in permanently). Step 2
//! announces the winners with two-tier delivery: a threaded reply first, one
//! fallback to a plain channel send referencing the original message.
//!
//! Neither step can fail the pipeline. Finalization is the caller's job and
//! must happen after delivery was *attempted*, not after it succeeded.

use tracing::{debug, warn};

use crate::lottery::Winner;
use crate::types::GiveawayRecord;

use super::summary::ResultSummary;
use super::MessageChannel;

/// How the winner announcement went out, if it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnounceOutcome {
    /// The threaded reply succeeded.
    Replied,

    /// The reply failed; the plain-send fallback succeeded.
    FellBack,

    /// Both tiers failed. Logged; never blocks finalization.
    Failed,
}

/// What the pipeline managed to deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryOutcome {
    /// Whether the announcement edit landed.
    pub edited: bool,

    /// Which announcement tier succeeded.
    pub announcement: AnnounceOutcome,
}

/// Edits the announcement and announces winners over one channel.
#[derive(Debug)]
pub struct ResultDeliveryPipeline<C> {
    channel: C,
}

impl<C: MessageChannel> ResultDeliveryPipeline<C> {
    pub fn new(channel: C) -> Self {
        ResultDeliveryPipeline { channel }
    }

    /// Delivers results for a processed record. Infallible by design: every
    /// failure is logged and folded into the returned outcome.
    pub async fn deliver(&self, record: &GiveawayRecord, winners: &[Winner]) -> DeliveryOutcome {
        let summary = ResultSummary::new(record, winners);

        let edited = match self
            .channel
            .edit_message(record.message_id, summary.to_edit())
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    giveaway = %record.id,
                    message = %record.message_id,
                    error = %e,
                    "Failed to edit giveaway announcement"
                );
                false
            }
        };

        let announcement = self.announce(record, &summary).await;

        DeliveryOutcome {
            edited,
            announcement,
        }
    }

    /// Two-tier announcement: reply, then one plain-send fallback.
    async fn announce(&self, record: &GiveawayRecord, summary: &ResultSummary) -> AnnounceOutcome {
        match self
            .channel
            .reply(record.message_id, summary.announcement())
            .await
        {
            Ok(()) => {
                debug!(giveaway = %record.id, "Winner announcement replied");
                return AnnounceOutcome::Replied;
            }
            Err(e) => {
                warn!(
                    giveaway = %record.id,
                    message = %record.message_id,
                    error = %e,
                    "Winner reply failed, falling back to plain send"
                );
            }
        }

        match self
            .channel
            .send(
                summary.fallback_announcement(record.message_id),
                Some(record.message_id),
            )
            .await
        {
            Ok(()) => AnnounceOutcome::FellBack,
            Err(e) => {
                warn!(
                    giveaway = %record.id,
                    channel = %record.channel_id,
                    error = %e,
                    "Winner announcement failed on both tiers"
                );
                AnnounceOutcome::Failed
            }
        }
    }
}
