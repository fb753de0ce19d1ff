//! Member directory capability.
//!
//! The chat platform owns membership data; this module abstracts it behind
//! the [`MemberDirectory`] trait so the lottery can be driven by any backing
//! cache (the real gateway's member cache, or fakes in tests).
//!
//! The four operations mirror the four resolution layers, cheapest first:
//! `lookup` (cache), `bulk_fetch`, `fetch` (individual), `fetch_raw_user`
//! (bare user, not a guild member). Each may fail independently; the
//! [`resolver::MemberResolver`] decides what failures mean.

pub mod resolver;

use std::fmt;
use std::future::Future;

use crate::types::{RoleId, UserId};

pub use resolver::{MemberResolver, Resolution};

/// A guild member resolved through the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// The member's user id.
    pub id: UserId,

    /// The platform-wide username.
    pub username: String,

    /// Guild-specific nickname, if set.
    pub nick: Option<String>,

    /// Roles the member holds (input to the weighted lottery).
    pub roles: Vec<RoleId>,
}

impl Member {
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Member {
            id,
            username: username.into(),
            nick: None,
            roles: Vec::new(),
        }
    }

    /// Adds roles to the member (builder-style, used heavily in tests).
    pub fn with_roles(mut self, roles: impl IntoIterator<Item = RoleId>) -> Self {
        self.roles.extend(roles);
        self
    }

    /// The name to show in announcements: nickname if set, else username.
    pub fn display_name(&self) -> &str {
        self.nick.as_deref().unwrap_or(&self.username)
    }
}

/// A bare platform user, fetched as a last resort when no guild member
/// resolves (e.g., every drawn participant has left the guild).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawUser {
    pub id: UserId,
    pub username: String,
}

/// Asynchronous, independently-fallible access to community membership.
///
/// Implementations are constructed scoped to one guild; ids passed in are
/// member ids within that guild.
pub trait MemberDirectory: Send + Sync {
    /// The error type returned by fallible layers.
    type Error: fmt::Display + Send;

    /// Cache-only lookup. A miss is `None`, not an error.
    fn lookup(&self, id: UserId) -> impl Future<Output = Option<Member>> + Send;

    /// Fetches many members at once. Ids that don't resolve are simply
    /// absent from the result.
    fn bulk_fetch(
        &self,
        ids: &[UserId],
    ) -> impl Future<Output = Result<Vec<Member>, Self::Error>> + Send;

    /// Fetches a single member by id.
    fn fetch(&self, id: UserId) -> impl Future<Output = Result<Member, Self::Error>> + Send;

    /// Fetches a bare user (not a guild member) by id.
    fn fetch_raw_user(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<RawUser, Self::Error>> + Send;
}
