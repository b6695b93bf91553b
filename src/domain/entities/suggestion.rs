use super::follower_summary::FollowerSummary;
use crate::domain::value_objects::UserId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionEntry {
    pub user_id: UserId,
    pub display_name: String,
    pub follower_count: u64,
    pub is_followed_by_viewer: bool,
}

impl SuggestionEntry {
    pub fn summary(&self) -> FollowerSummary {
        FollowerSummary::new(self.follower_count, self.is_followed_by_viewer)
    }

    pub fn with_summary(self, summary: FollowerSummary) -> Self {
        Self {
            follower_count: summary.follower_count,
            is_followed_by_viewer: summary.is_followed_by_viewer,
            ..self
        }
    }
}
