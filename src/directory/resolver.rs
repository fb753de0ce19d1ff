//! Layered member resolution.
//!
//! The resolver wraps a [`MemberDirectory`] with the failure policy the
//! lottery needs: per-candidate outcomes are values, never exceptions, so
//! one bad candidate cannot unwind a whole pick.
//!
//! Layer policy:
//! - cache lookup: a miss is a miss, nothing to fail
//! - bulk fetch: failure is logged at warn and yields no members
//! - individual fetch: failure is swallowed per candidate (debug log)
//! - raw user fetch: failure is swallowed; the caller decides whether the
//!   overall outcome deserves a warning

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::types::UserId;

use super::{Member, MemberDirectory, RawUser};

/// Per-candidate resolution outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The candidate resolved to a guild member.
    Resolved(Member),

    /// The candidate did not resolve at this layer.
    Unresolved(UserId),
}

impl Resolution {
    /// The candidate's id, resolved or not.
    pub fn id(&self) -> UserId {
        match self {
            Resolution::Resolved(member) => member.id,
            Resolution::Unresolved(id) => *id,
        }
    }

    /// Returns the member if resolved.
    pub fn member(self) -> Option<Member> {
        match self {
            Resolution::Resolved(member) => Some(member),
            Resolution::Unresolved(_) => None,
        }
    }
}

/// Layered identifier→member resolution over an injected directory.
#[derive(Debug)]
pub struct MemberResolver<D> {
    directory: D,
}

impl<D: MemberDirectory> MemberResolver<D> {
    pub fn new(directory: D) -> Self {
        MemberResolver { directory }
    }

    /// Cache layer: resolves from the directory's cache only.
    pub async fn from_cache(&self, id: UserId) -> Option<Member> {
        self.directory.lookup(id).await
    }

    /// Bulk layer: one fetch for all still-missing ids.
    ///
    /// Returns the members that resolved, keyed by id. A bulk-fetch failure
    /// is logged at warn and treated as "nothing resolved" — the pick
    /// continues with the remaining layers.
    pub async fn bulk(&self, ids: &[UserId]) -> HashMap<UserId, Member> {
        if ids.is_empty() {
            return HashMap::new();
        }
        match self.directory.bulk_fetch(ids).await {
            Ok(members) => members.into_iter().map(|m| (m.id, m)).collect(),
            Err(e) => {
                warn!(requested = ids.len(), error = %e, "Bulk member fetch failed");
                HashMap::new()
            }
        }
    }

    /// Individual layer: best-effort fetch of one member.
    ///
    /// Failure never propagates; the candidate is simply unresolved.
    pub async fn individual(&self, id: UserId) -> Option<Member> {
        match self.directory.fetch(id).await {
            Ok(member) => Some(member),
            Err(e) => {
                debug!(user = %id, error = %e, "Individual member fetch failed");
                None
            }
        }
    }

    /// Last-resort layer: fetch a bare user that may not be a guild member.
    pub async fn raw_user(&self, id: UserId) -> Option<RawUser> {
        match self.directory.fetch_raw_user(id).await {
            Ok(user) => Some(user),
            Err(e) => {
                debug!(user = %id, error = %e, "Raw user fetch failed");
                None
            }
        }
    }

    /// Resolves a whole candidate list through cache → bulk → individual,
    /// returning one [`Resolution`] per input id, in input order.
    ///
    /// This is the quota-free form of the layering; the lottery engine
    /// drives the layers itself when it can stop early on a filled quota.
    pub async fn resolve(&self, ids: &[UserId]) -> Vec<Resolution> {
        let mut resolved: HashMap<UserId, Member> = HashMap::new();

        for &id in ids {
            if let Some(member) = self.from_cache(id).await {
                resolved.insert(id, member);
            }
        }

        let missing: Vec<UserId> = ids
            .iter()
            .copied()
            .filter(|id| !resolved.contains_key(id))
            .collect();
        resolved.extend(self.bulk(&missing).await);

        for &id in &missing {
            if resolved.contains_key(&id) {
                continue;
            }
            if let Some(member) = self.individual(id).await {
                resolved.insert(id, member);
            }
        }

        ids.iter()
            .map(|id| match resolved.remove(id) {
                Some(member) => Resolution::Resolved(member),
                None => Resolution::Unresolved(*id),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeDirectory;

    #[tokio::test]
    async fn cache_hits_come_from_cache_only() {
        let directory = FakeDirectory::new();
        directory.add_cached(Member::new(UserId(1), "cached"));
        directory.add_fetchable(Member::new(UserId(2), "fetchable"));
        let resolver = MemberResolver::new(directory);

        assert!(resolver.from_cache(UserId(1)).await.is_some());
        assert!(resolver.from_cache(UserId(2)).await.is_none());
    }

    #[tokio::test]
    async fn bulk_failure_yields_empty_map() {
        let directory = FakeDirectory::new();
        directory.add_fetchable(Member::new(UserId(1), "member"));
        directory.fail_bulk();
        let resolver = MemberResolver::new(directory);

        let out = resolver.bulk(&[UserId(1)]).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn individual_failure_is_swallowed() {
        let directory = FakeDirectory::new();
        directory.fail_fetch();
        let resolver = MemberResolver::new(directory);

        assert!(resolver.individual(UserId(1)).await.is_none());
    }

    #[tokio::test]
    async fn resolve_layers_cache_then_bulk_then_individual() {
        let directory = FakeDirectory::new();
        directory.add_cached(Member::new(UserId(1), "cached"));
        directory.add_bulk_only(Member::new(UserId(2), "bulk"));
        directory.add_fetch_only(Member::new(UserId(3), "individual"));
        let resolver = MemberResolver::new(directory);

        let ids = [UserId(1), UserId(2), UserId(3), UserId(4)];
        let resolutions = resolver.resolve(&ids).await;

        assert_eq!(resolutions.len(), 4);
        assert!(matches!(&resolutions[0], Resolution::Resolved(m) if m.username == "cached"));
        assert!(matches!(&resolutions[1], Resolution::Resolved(m) if m.username == "bulk"));
        assert!(matches!(&resolutions[2], Resolution::Resolved(m) if m.username == "individual"));
        assert_eq!(resolutions[3], Resolution::Unresolved(UserId(4)));
    }

    #[tokio::test]
    async fn resolve_does_not_bulk_fetch_cached_ids() {
        let directory = FakeDirectory::new();
        directory.add_cached(Member::new(UserId(1), "cached"));
        let resolver = MemberResolver::new(directory);

        resolver.resolve(&[UserId(1)]).await;
        assert_eq!(resolver.directory.bulk_requests(), Vec::<Vec<UserId>>::new());
    }
}
