//! Chat-platform capability: scoping directories and channels.
//!
//! The member directory contract is per-guild and the message channel
//! contract is per-channel, but the claim loop serves every guild. This
//! trait is the seam between the two: given the ids on a claimed record, it
//! opens the scoped capabilities — or fails, which the scheduler treats as
//! the unrecoverable "guild/channel not resolvable" case (forced finalize).

pub mod logging;

use std::fmt;
use std::future::Future;

use crate::delivery::MessageChannel;
use crate::directory::MemberDirectory;
use crate::types::{ChannelId, GuildId};

pub use logging::{LoggingChannel, NullDirectory, NullPlatform};

/// Opens guild-scoped and channel-scoped capabilities for record processing.
pub trait ChatPlatform: Send + Sync {
    type Directory: MemberDirectory;
    type Channel: MessageChannel;

    /// The error type for unresolvable guilds/channels.
    type Error: fmt::Display + Send;

    /// Opens the member directory for a guild.
    fn guild_directory(
        &self,
        guild: GuildId,
    ) -> impl Future<Output = Result<Self::Directory, Self::Error>> + Send;

    /// Opens the channel holding a giveaway's announcement.
    fn open_channel(
        &self,
        guild: GuildId,
        channel: ChannelId,
    ) -> impl Future<Output = Result<Self::Channel, Self::Error>> + Send;
}
