use serde::{Deserialize, Serialize};
use std::fmt;

use super::{CommentId, PostId, UserId};

const SEPARATOR: char = ':';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheKind {
    FollowerSummary,
    SuggestionList,
    PostEngagement,
    CommentEngagement,
    Post,
    FeedPage,
    CommentList,
}

impl CacheKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKind::FollowerSummary => "follower-summary",
            CacheKind::SuggestionList => "suggestion-list",
            CacheKind::PostEngagement => "post-engagement",
            CacheKind::CommentEngagement => "comment-engagement",
            CacheKind::Post => "post",
            CacheKind::FeedPage => "feed-page",
            CacheKind::CommentList => "comment-list",
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "userId", rename_all = "snake_case")]
pub enum FeedScope {
    Home,
    Following,
    Author(UserId),
}

/// Address of one cached view: view kind plus its scope parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CacheKey {
    FollowerSummary { user_id: UserId },
    SuggestionList,
    PostEngagement { post_id: PostId },
    CommentEngagement { comment_id: CommentId },
    Post { post_id: PostId },
    FeedPage { scope: FeedScope, page: u32 },
    CommentList { post_id: PostId },
}

impl CacheKey {
    pub fn follower_summary(user_id: &UserId) -> Self {
        CacheKey::FollowerSummary {
            user_id: user_id.clone(),
        }
    }

    pub fn post_engagement(post_id: &PostId) -> Self {
        CacheKey::PostEngagement {
            post_id: post_id.clone(),
        }
    }

    pub fn comment_engagement(comment_id: &CommentId) -> Self {
        CacheKey::CommentEngagement {
            comment_id: comment_id.clone(),
        }
    }

    pub fn post(post_id: &PostId) -> Self {
        CacheKey::Post {
            post_id: post_id.clone(),
        }
    }

    pub fn feed_page(scope: FeedScope, page: u32) -> Self {
        CacheKey::FeedPage { scope, page }
    }

    pub fn comment_list(post_id: &PostId) -> Self {
        CacheKey::CommentList {
            post_id: post_id.clone(),
        }
    }

    pub fn kind(&self) -> CacheKind {
        match self {
            CacheKey::FollowerSummary { .. } => CacheKind::FollowerSummary,
            CacheKey::SuggestionList => CacheKind::SuggestionList,
            CacheKey::PostEngagement { .. } => CacheKind::PostEngagement,
            CacheKey::CommentEngagement { .. } => CacheKind::CommentEngagement,
            CacheKey::Post { .. } => CacheKind::Post,
            CacheKey::FeedPage { .. } => CacheKind::FeedPage,
            CacheKey::CommentList { .. } => CacheKind::CommentList,
        }
    }

    /// Canonical `kind:scope...` path.
    pub fn path(&self) -> String {
        let kind = self.kind().as_str();
        match self {
            CacheKey::FollowerSummary { user_id } => format!("{kind}:{user_id}"),
            CacheKey::SuggestionList => kind.to_string(),
            CacheKey::PostEngagement { post_id }
            | CacheKey::Post { post_id }
            | CacheKey::CommentList { post_id } => format!("{kind}:{post_id}"),
            CacheKey::CommentEngagement { comment_id } => format!("{kind}:{comment_id}"),
            CacheKey::FeedPage { scope, page } => match scope {
                FeedScope::Home => format!("{kind}:home:{page}"),
                FeedScope::Following => format!("{kind}:following:{page}"),
                FeedScope::Author(user_id) => format!("{kind}:author:{user_id}:{page}"),
            },
        }
    }

    /// Segment-aware prefix match: `feed-page:home:1` is not a prefix of `feed-page:home:10`.
    pub fn has_prefix(&self, prefix: &str) -> bool {
        let prefix = prefix.trim_end_matches(SEPARATOR);
        if prefix.is_empty() {
            return true;
        }
        let path = self.path();
        match path.strip_prefix(prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with(SEPARATOR),
            None => false,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Declarative key set used by action adapters; resolved by the cache store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeySelector {
    Exact(CacheKey),
    Kind(CacheKind),
    /// Segment-aware path prefix, e.g. `feed-page:following`.
    Prefix(String),
}

impl KeySelector {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        KeySelector::Prefix(prefix.into())
    }

    pub fn matches(&self, key: &CacheKey) -> bool {
        match self {
            KeySelector::Exact(exact) => exact == key,
            KeySelector::Kind(kind) => key.kind() == *kind,
            KeySelector::Prefix(prefix) => key.has_prefix(prefix),
        }
    }
}

impl From<CacheKey> for KeySelector {
    fn from(key: CacheKey) -> Self {
        KeySelector::Exact(key)
    }
}

impl From<CacheKind> for KeySelector {
    fn from(kind: CacheKind) -> Self {
        KeySelector::Kind(kind)
    }
}
