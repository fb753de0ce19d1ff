//! Result delivery: closing the announcement and announcing winners.
//!
//! The chat platform's message operations are abstracted behind the
//! [`MessageChannel`] trait, scoped to the one channel holding the giveaway
//! announcement. The [`pipeline::ResultDeliveryPipeline`] layers fallback
//! semantics on top: an edit failure never blocks the announcement, and a
//! failed reply falls back once to a plain send that references the original
//! message. Message delivery is best-effort; only the store's finalize
//! transition (owned by the caller) is guaranteed.

pub mod pipeline;
pub mod summary;

use std::fmt;
use std::future::Future;

use crate::types::MessageId;

pub use pipeline::{AnnounceOutcome, DeliveryOutcome, ResultDeliveryPipeline};
pub use summary::ResultSummary;

/// Replacement content for the original announcement message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncementEdit {
    /// The rendered result summary replacing the announcement embed.
    /// Cosmetic layout is the gateway's concern; this is the content.
    pub embed_text: String,

    /// Remove all interactive components, permanently closing opt-in.
    pub clear_components: bool,
}

/// Asynchronous, independently-fallible message operations on one channel.
pub trait MessageChannel: Send + Sync {
    /// The error type returned by failed operations.
    type Error: fmt::Display + Send;

    /// Edits a message in place.
    fn edit_message(
        &self,
        id: MessageId,
        edit: AnnouncementEdit,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Sends a message as a threaded reply to an existing message.
    fn reply(
        &self,
        id: MessageId,
        content: String,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Sends a plain channel message, optionally referencing another message.
    fn send(
        &self,
        content: String,
        reference: Option<MessageId>,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
