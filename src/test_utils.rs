//! Shared test fakes and arbitrary generators for property-based testing.
//!
//! The fakes are `Clone` with shared interior state, so a test can hand a
//! clone to the code under test and inspect recorded calls afterwards.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use thiserror::Error;

use crate::delivery::{AnnouncementEdit, MessageChannel};
use crate::directory::{Member, MemberDirectory, RawUser};
use crate::platform::ChatPlatform;
use crate::types::{ChannelId, GuildId, MessageId, UserId};

/// Error produced by fakes told to fail.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct FakeFailure(pub &'static str);

// ─── FakeDirectory ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct FakeDirectoryState {
    cached: HashMap<UserId, Member>,
    bulk_members: HashMap<UserId, Member>,
    fetch_members: HashMap<UserId, Member>,
    raw_users: HashMap<UserId, RawUser>,
    fail_bulk: bool,
    fail_fetch: bool,
    fail_raw: bool,
    lookup_calls: usize,
    bulk_requests: Vec<Vec<UserId>>,
    fetch_calls: Vec<UserId>,
    raw_calls: Vec<UserId>,
}

/// In-memory member directory recording every call.
#[derive(Debug, Clone, Default)]
pub struct FakeDirectory {
    state: Arc<Mutex<FakeDirectoryState>>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        FakeDirectory::default()
    }

    /// Member resolvable from the cache layer.
    pub fn add_cached(&self, member: Member) {
        self.state.lock().unwrap().cached.insert(member.id, member);
    }

    /// Member resolvable from both bulk and individual fetches (but not
    /// the cache), like a member the gateway knows but has not cached.
    pub fn add_fetchable(&self, member: Member) {
        let mut state = self.state.lock().unwrap();
        state.bulk_members.insert(member.id, member.clone());
        state.fetch_members.insert(member.id, member);
    }

    /// Member resolvable only by the bulk layer.
    pub fn add_bulk_only(&self, member: Member) {
        self.state
            .lock()
            .unwrap()
            .bulk_members
            .insert(member.id, member);
    }

    /// Member resolvable only by the individual-fetch layer.
    pub fn add_fetch_only(&self, member: Member) {
        self.state
            .lock()
            .unwrap()
            .fetch_members
            .insert(member.id, member);
    }

    /// Bare user resolvable by the raw-user layer.
    pub fn add_raw_user(&self, user: RawUser) {
        self.state.lock().unwrap().raw_users.insert(user.id, user);
    }

    pub fn fail_bulk(&self) {
        self.state.lock().unwrap().fail_bulk = true;
    }

    pub fn fail_fetch(&self) {
        self.state.lock().unwrap().fail_fetch = true;
    }

    pub fn fail_raw(&self) {
        self.state.lock().unwrap().fail_raw = true;
    }

    pub fn lookup_calls(&self) -> usize {
        self.state.lock().unwrap().lookup_calls
    }

    pub fn bulk_requests(&self) -> Vec<Vec<UserId>> {
        self.state.lock().unwrap().bulk_requests.clone()
    }

    pub fn fetch_calls(&self) -> Vec<UserId> {
        self.state.lock().unwrap().fetch_calls.clone()
    }

    pub fn raw_calls(&self) -> Vec<UserId> {
        self.state.lock().unwrap().raw_calls.clone()
    }

    /// Total calls across every resolution layer.
    pub fn resolution_calls(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.lookup_calls
            + state.bulk_requests.len()
            + state.fetch_calls.len()
            + state.raw_calls.len()
    }
}

impl MemberDirectory for FakeDirectory {
    type Error = FakeFailure;

    async fn lookup(&self, id: UserId) -> Option<Member> {
        let mut state = self.state.lock().unwrap();
        state.lookup_calls += 1;
        state.cached.get(&id).cloned()
    }

    async fn bulk_fetch(&self, ids: &[UserId]) -> Result<Vec<Member>, Self::Error> {
        let mut state = self.state.lock().unwrap();
        state.bulk_requests.push(ids.to_vec());
        if state.fail_bulk {
            return Err(FakeFailure("bulk fetch failed"));
        }
        Ok(ids
            .iter()
            .filter_map(|id| state.bulk_members.get(id).cloned())
            .collect())
    }

    async fn fetch(&self, id: UserId) -> Result<Member, Self::Error> {
        let mut state = self.state.lock().unwrap();
        state.fetch_calls.push(id);
        if state.fail_fetch {
            return Err(FakeFailure("fetch failed"));
        }
        state
            .fetch_members
            .get(&id)
            .cloned()
            .ok_or(FakeFailure("unknown member"))
    }

    async fn fetch_raw_user(&self, id: UserId) -> Result<RawUser, Self::Error> {
        let mut state = self.state.lock().unwrap();
        state.raw_calls.push(id);
        if state.fail_raw {
            return Err(FakeFailure("raw user fetch failed"));
        }
        state
            .raw_users
            .get(&id)
            .cloned()
            .ok_or(FakeFailure("unknown user"))
    }
}

// ─── FakeChannel ──────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct FakeChannelState {
    edits: Vec<(MessageId, AnnouncementEdit)>,
    replies: Vec<(MessageId, String)>,
    sends: Vec<(String, Option<MessageId>)>,
    fail_edit: bool,
    fail_reply: bool,
    fail_send: bool,
}

/// In-memory message channel recording every operation.
#[derive(Debug, Clone, Default)]
pub struct FakeChannel {
    state: Arc<Mutex<FakeChannelState>>,
}

impl FakeChannel {
    pub fn new() -> Self {
        FakeChannel::default()
    }

    pub fn fail_edit(&self) {
        self.state.lock().unwrap().fail_edit = true;
    }

    pub fn fail_reply(&self) {
        self.state.lock().unwrap().fail_reply = true;
    }

    pub fn fail_send(&self) {
        self.state.lock().unwrap().fail_send = true;
    }

    pub fn edits(&self) -> Vec<(MessageId, AnnouncementEdit)> {
        self.state.lock().unwrap().edits.clone()
    }

    pub fn replies(&self) -> Vec<(MessageId, String)> {
        self.state.lock().unwrap().replies.clone()
    }

    pub fn sends(&self) -> Vec<(String, Option<MessageId>)> {
        self.state.lock().unwrap().sends.clone()
    }

    /// Total message operations attempted against this channel.
    pub fn operations(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.edits.len() + state.replies.len() + state.sends.len()
    }
}

impl MessageChannel for FakeChannel {
    type Error = FakeFailure;

    async fn edit_message(&self, id: MessageId, edit: AnnouncementEdit) -> Result<(), Self::Error> {
        let mut state = self.state.lock().unwrap();
        if state.fail_edit {
            return Err(FakeFailure("edit failed"));
        }
        state.edits.push((id, edit));
        Ok(())
    }

    async fn reply(&self, id: MessageId, content: String) -> Result<(), Self::Error> {
        let mut state = self.state.lock().unwrap();
        if state.fail_reply {
            return Err(FakeFailure("reply failed"));
        }
        state.replies.push((id, content));
        Ok(())
    }

    async fn send(&self, content: String, reference: Option<MessageId>) -> Result<(), Self::Error> {
        let mut state = self.state.lock().unwrap();
        if state.fail_send {
            return Err(FakeFailure("send failed"));
        }
        state.sends.push((content, reference));
        Ok(())
    }
}

// ─── FakePlatform ─────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct FakePlatformState {
    directories: HashMap<GuildId, FakeDirectory>,
    channels: HashMap<(GuildId, ChannelId), FakeChannel>,
}

/// Platform resolving only explicitly registered guilds and channels.
#[derive(Debug, Clone, Default)]
pub struct FakePlatform {
    state: Arc<Mutex<FakePlatformState>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        FakePlatform::default()
    }

    /// Registers a guild's directory; unregistered guilds fail to resolve.
    pub fn add_guild(&self, guild: GuildId, directory: FakeDirectory) {
        self.state
            .lock()
            .unwrap()
            .directories
            .insert(guild, directory);
    }

    /// Registers a channel; unregistered channels fail to resolve.
    pub fn add_channel(&self, guild: GuildId, channel: ChannelId, fake: FakeChannel) {
        self.state
            .lock()
            .unwrap()
            .channels
            .insert((guild, channel), fake);
    }
}

impl ChatPlatform for FakePlatform {
    type Directory = FakeDirectory;
    type Channel = FakeChannel;
    type Error = FakeFailure;

    async fn guild_directory(&self, guild: GuildId) -> Result<Self::Directory, Self::Error> {
        self.state
            .lock()
            .unwrap()
            .directories
            .get(&guild)
            .cloned()
            .ok_or(FakeFailure("unknown guild"))
    }

    async fn open_channel(
        &self,
        guild: GuildId,
        channel: ChannelId,
    ) -> Result<Self::Channel, Self::Error> {
        self.state
            .lock()
            .unwrap()
            .channels
            .get(&(guild, channel))
            .cloned()
            .ok_or(FakeFailure("unknown channel"))
    }
}

// ─── Arbitrary Generators ─────────────────────────────────────────────────────

pub fn arb_user_id() -> impl Strategy<Value = UserId> {
    (1u64..1_000_000).prop_map(UserId)
}

/// A participant list with unique ids (participants have set semantics).
pub fn arb_participants(max: usize) -> impl Strategy<Value = Vec<UserId>> {
    prop::collection::hash_set(1u64..1_000_000, 0..max)
        .prop_map(|set| set.into_iter().map(UserId).collect())
}

/// Builds a member named after its id.
pub fn make_member(id: UserId) -> Member {
    Member::new(id, format!("user-{id}"))
}
