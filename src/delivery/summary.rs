//! Rendering the result summary.
//!
//! One summary feeds both delivery steps: the announcement edit (closing the
//! giveaway) and the winner message. Formatting here is deliberately plain
//! text; embed cosmetics belong to the gateway layer.

use chrono::{DateTime, Utc};

use crate::lottery::Winner;
use crate::types::GiveawayRecord;

use super::AnnouncementEdit;

/// The marker shown when no winner could be drawn or resolved.
pub const NO_WINNERS_MARKER: &str = "No valid winners";

/// Everything the delivery pipeline says about a finished giveaway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSummary {
    pub prize: String,
    pub description: Option<String>,
    pub ended_at: DateTime<Utc>,
    pub host_mention: String,
    pub participant_count: usize,
    pub winners: Vec<Winner>,
}

impl ResultSummary {
    /// Builds the summary for a processed record and its drawn winners.
    pub fn new(record: &GiveawayRecord, winners: &[Winner]) -> Self {
        ResultSummary {
            prize: record.prize.clone(),
            description: record.description.clone(),
            ended_at: record.end_time,
            host_mention: record.host_id.mention(),
            participant_count: record.participants.len(),
            winners: winners.to_vec(),
        }
    }

    /// The winner list as mentions, or the explicit no-winners marker.
    pub fn winners_line(&self) -> String {
        if self.winners.is_empty() {
            return NO_WINNERS_MARKER.to_string();
        }
        self.winners
            .iter()
            .map(|w| w.id.mention())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The replacement content for the original announcement.
    pub fn to_edit(&self) -> AnnouncementEdit {
        let mut text = format!(
            "**{}**\n\nEnded: {}\nHosted by: {}\nEntries: {}\nWinners: {}",
            self.prize,
            self.ended_at.format("%Y-%m-%d %H:%M UTC"),
            self.host_mention,
            self.participant_count,
            self.winners_line(),
        );
        if let Some(description) = &self.description {
            text = format!("{}\n\n{}", text, description);
        }
        AnnouncementEdit {
            embed_text: text,
            clear_components: true,
        }
    }

    /// The winner announcement message.
    pub fn announcement(&self) -> String {
        if self.winners.is_empty() {
            format!(
                "No one won **{}**: no valid entrants could be drawn.",
                self.prize
            )
        } else {
            format!(
                "Congratulations {}! You won **{}**!",
                self.winners_line(),
                self.prize
            )
        }
    }

    /// The announcement rephrased for the plain-send fallback, naming the
    /// original message since the thread context is lost.
    pub fn fallback_announcement(&self, original: crate::types::MessageId) -> String {
        format!("{} (giveaway {})", self.announcement(), original)
    }
}
