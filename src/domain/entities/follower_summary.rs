use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FollowerSummary {
    pub follower_count: u64,
    pub is_followed_by_viewer: bool,
}

impl FollowerSummary {
    pub fn new(follower_count: u64, is_followed_by_viewer: bool) -> Self {
        Self {
            follower_count,
            is_followed_by_viewer,
        }
    }

    /// Following an already-followed user leaves the count untouched.
    pub fn followed(self) -> Self {
        if self.is_followed_by_viewer {
            return self;
        }
        Self {
            follower_count: self.follower_count.saturating_add(1),
            is_followed_by_viewer: true,
        }
    }

    pub fn unfollowed(self) -> Self {
        if !self.is_followed_by_viewer {
            return self;
        }
        Self {
            follower_count: self.follower_count.saturating_sub(1),
            is_followed_by_viewer: false,
        }
    }

    pub fn with_follower_count(self, follower_count: u64) -> Self {
        Self {
            follower_count,
            ..self
        }
    }
}
