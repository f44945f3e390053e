//! Feed fetching seam between the poller and the HTTP client

use async_trait::async_trait;
use compact_str::CompactString;

use super::error::Result;
use crate::{
    domain::ActivityDto,
    id::SpotId,
    resource::{SpotRef, UserRef},
};

/// What one subscription polls.
///
/// Spot and friend-activity targets key off a resource id; `Path` polls an
/// arbitrary feed-shaped endpoint by request path.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum PollTarget {
    Spot(SpotId),
    FriendActivity(CompactString),
    Path(CompactString),
}

impl PollTarget {
    pub fn spot(id: impl Into<CompactString>) -> Self {
        Self::Spot(SpotId::new(id))
    }

    pub fn friend_activity(username: impl Into<CompactString>) -> Self {
        Self::FriendActivity(username.into())
    }

    pub fn path(path: impl Into<CompactString>) -> Self {
        Self::Path(path.into())
    }

    /// Request path for this target
    pub fn request_path(&self) -> CompactString {
        match self {
            PollTarget::Spot(id) => SpotRef::new(id.clone()).events_path(),
            PollTarget::FriendActivity(username) => {
                UserRef::new(username.clone()).friend_activity_path()
            },
            PollTarget::Path(path) => path.clone(),
        }
    }
}

impl std::fmt::Display for PollTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.request_path())
    }
}

/// Source of activity pages, newest-first.
///
/// [`GowallaApi`](super::api::GowallaApi) is the production implementation;
/// tests substitute scripted sources.
#[async_trait]
pub trait FeedSource: Send + Sync + 'static {
    async fn fetch_feed(&self, target: &PollTarget) -> Result<Vec<ActivityDto>>;
}
