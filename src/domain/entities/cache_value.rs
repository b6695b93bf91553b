use super::comment::CommentThread;
use super::engagement::EngagementSummary;
use super::follower_summary::FollowerSummary;
use super::post::{FeedPage, Post};
use super::suggestion::SuggestionEntry;
use crate::domain::value_objects::{CacheKind, UserId};
use serde::{Deserialize, Serialize};

/// Value held by one cache entry; the variant follows the key's kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum CacheValue {
    FollowerSummary(FollowerSummary),
    SuggestionList(Vec<SuggestionEntry>),
    PostEngagement(EngagementSummary),
    CommentEngagement(EngagementSummary),
    Post(Post),
    FeedPage(FeedPage),
    CommentList(CommentThread),
}

impl CacheValue {
    pub fn kind(&self) -> CacheKind {
        match self {
            CacheValue::FollowerSummary(_) => CacheKind::FollowerSummary,
            CacheValue::SuggestionList(_) => CacheKind::SuggestionList,
            CacheValue::PostEngagement(_) => CacheKind::PostEngagement,
            CacheValue::CommentEngagement(_) => CacheKind::CommentEngagement,
            CacheValue::Post(_) => CacheKind::Post,
            CacheValue::FeedPage(_) => CacheKind::FeedPage,
            CacheValue::CommentList(_) => CacheKind::CommentList,
        }
    }

    pub fn as_follower_summary(&self) -> Option<&FollowerSummary> {
        match self {
            CacheValue::FollowerSummary(summary) => Some(summary),
            _ => None,
        }
    }

    pub fn as_engagement(&self) -> Option<&EngagementSummary> {
        match self {
            CacheValue::PostEngagement(summary) | CacheValue::CommentEngagement(summary) => {
                Some(summary)
            }
            _ => None,
        }
    }

    pub fn as_feed_page(&self) -> Option<&FeedPage> {
        match self {
            CacheValue::FeedPage(page) => Some(page),
            _ => None,
        }
    }

    pub fn as_comment_thread(&self) -> Option<&CommentThread> {
        match self {
            CacheValue::CommentList(thread) => Some(thread),
            _ => None,
        }
    }

    pub fn as_post(&self) -> Option<&Post> {
        match self {
            CacheValue::Post(post) => Some(post),
            _ => None,
        }
    }

    pub fn as_suggestions(&self) -> Option<&[SuggestionEntry]> {
        match self {
            CacheValue::SuggestionList(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn mentions_user(&self, user_id: &UserId) -> bool {
        match self {
            CacheValue::SuggestionList(entries) => {
                entries.iter().any(|entry| &entry.user_id == user_id)
            }
            _ => false,
        }
    }
}
