//! Dry-run platform: logs message operations instead of executing them.
//!
//! Used when no chat gateway is wired in (local runs, smoke tests). Every
//! guild resolves, every channel resolves, every message operation succeeds
//! after logging what it would have done. The directory resolves nobody, so
//! picks fall through the resolution layers and announce the no-winners
//! marker — which exercises the whole pipeline without a gateway.

use thiserror::Error;
use tracing::{debug, info};

use crate::delivery::{AnnouncementEdit, MessageChannel};
use crate::directory::{Member, MemberDirectory, RawUser};
use crate::types::{ChannelId, GuildId, MessageId, UserId};

use super::ChatPlatform;

/// Error for directory layers that have nothing to fetch from.
#[derive(Debug, Error)]
#[error("no chat gateway connected")]
pub struct NotConnected;

/// A directory with no backing gateway: cache always misses, fetches fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDirectory;

impl MemberDirectory for NullDirectory {
    type Error = NotConnected;

    async fn lookup(&self, _id: UserId) -> Option<Member> {
        None
    }

    async fn bulk_fetch(&self, ids: &[UserId]) -> Result<Vec<Member>, Self::Error> {
        debug!(requested = ids.len(), "NullDirectory: bulk fetch (no gateway)");
        Ok(Vec::new())
    }

    async fn fetch(&self, _id: UserId) -> Result<Member, Self::Error> {
        Err(NotConnected)
    }

    async fn fetch_raw_user(&self, _id: UserId) -> Result<RawUser, Self::Error> {
        Err(NotConnected)
    }
}

/// A channel that logs operations instead of performing them.
#[derive(Debug, Clone, Copy)]
pub struct LoggingChannel {
    guild: GuildId,
    channel: ChannelId,
}

impl LoggingChannel {
    pub fn new(guild: GuildId, channel: ChannelId) -> Self {
        LoggingChannel { guild, channel }
    }
}

impl MessageChannel for LoggingChannel {
    type Error = std::convert::Infallible;

    async fn edit_message(&self, id: MessageId, edit: AnnouncementEdit) -> Result<(), Self::Error> {
        info!(
            guild = %self.guild,
            channel = %self.channel,
            message = %id,
            clear_components = edit.clear_components,
            "LoggingChannel: edit logged (not executed)"
        );
        Ok(())
    }

    async fn reply(&self, id: MessageId, content: String) -> Result<(), Self::Error> {
        info!(
            guild = %self.guild,
            channel = %self.channel,
            message = %id,
            content,
            "LoggingChannel: reply logged (not executed)"
        );
        Ok(())
    }

    async fn send(&self, content: String, reference: Option<MessageId>) -> Result<(), Self::Error> {
        info!(
            guild = %self.guild,
            channel = %self.channel,
            reference = ?reference,
            content,
            "LoggingChannel: send logged (not executed)"
        );
        Ok(())
    }
}

/// Dry-run platform wiring [`NullDirectory`] and [`LoggingChannel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPlatform;

impl NullPlatform {
    pub fn new() -> Self {
        NullPlatform
    }
}

impl ChatPlatform for NullPlatform {
    type Directory = NullDirectory;
    type Channel = LoggingChannel;
    type Error = std::convert::Infallible;

    async fn guild_directory(&self, _guild: GuildId) -> Result<Self::Directory, Self::Error> {
        Ok(NullDirectory)
    }

    async fn open_channel(
        &self,
        guild: GuildId,
        channel: ChannelId,
    ) -> Result<Self::Channel, Self::Error> {
        Ok(LoggingChannel::new(guild, channel))
    }
}
