use serde::{Deserialize, Serialize};

/// Like/comment counters shown on a post or comment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct EngagementSummary {
    pub like_count: u32,
    pub is_liked_by_viewer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<u32>,
}

impl EngagementSummary {
    pub fn new(like_count: u32, is_liked_by_viewer: bool) -> Self {
        Self {
            like_count,
            is_liked_by_viewer,
            comment_count: None,
        }
    }

    pub fn with_comment_count(self, comment_count: u32) -> Self {
        Self {
            comment_count: Some(comment_count),
            ..self
        }
    }

    pub fn liked(self) -> Self {
        if self.is_liked_by_viewer {
            return self;
        }
        Self {
            like_count: self.like_count.saturating_add(1),
            is_liked_by_viewer: true,
            ..self
        }
    }

    pub fn unliked(self) -> Self {
        if !self.is_liked_by_viewer {
            return self;
        }
        Self {
            like_count: self.like_count.saturating_sub(1),
            is_liked_by_viewer: false,
            ..self
        }
    }

    pub fn with_like_count(self, like_count: u32) -> Self {
        Self { like_count, ..self }
    }

    pub fn with_liked(self, is_liked_by_viewer: bool) -> Self {
        Self {
            is_liked_by_viewer,
            ..self
        }
    }

    pub fn comment_added(self) -> Self {
        Self {
            comment_count: self.comment_count.map(|count| count.saturating_add(1)),
            ..self
        }
    }

    pub fn comment_removed(self) -> Self {
        Self {
            comment_count: self.comment_count.map(|count| count.saturating_sub(1)),
            ..self
        }
    }
}
