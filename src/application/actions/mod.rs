//! Declarative action adapters: one per business action.
//!
//! An adapter never touches the cache store. It declares which keys it
//! affects, how to patch them optimistically, how to fold the server's
//! answer into a base value, and which request to send.

pub mod comment;
pub mod follow;
pub mod like;
pub mod post;

pub use comment::{CreateCommentAdapter, DeleteCommentAdapter, EditCommentAdapter};
pub use follow::FollowAdapter;
pub use like::{CommentLikeAdapter, PostLikeAdapter};
pub use post::{DeletePostAdapter, EditPostAdapter};

use crate::application::ports::ApiRequest;
use crate::domain::entities::CacheValue;
use crate::domain::value_objects::{
    ActionKind, CacheKey, CommentId, IdempotencyToken, KeySelector, PostId, TargetId, UserId,
};
use crate::shared::error::MutationError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// Inputs an optimistic patch may depend on. Patches are replayed, so they
/// must be a pure function of this context, the target and the prior value.
#[derive(Debug, Clone)]
pub struct AttemptContext {
    pub token: IdempotencyToken,
    pub viewer: UserId,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServerResponse {
    Confirmed(Value),
    /// The server reported the target state was already in place (409).
    AlreadyApplied,
}

impl ServerResponse {
    /// Decodes the confirmed payload; missing or malformed payloads yield the default.
    pub fn payload<T>(&self) -> T
    where
        T: DeserializeOwned + Default,
    {
        match self {
            ServerResponse::Confirmed(Value::Null) | ServerResponse::AlreadyApplied => {
                T::default()
            }
            ServerResponse::Confirmed(value) => serde_json::from_value(value.clone())
                .unwrap_or_else(|e| {
                    tracing::warn!("Unexpected mutation response payload: {}", e);
                    T::default()
                }),
        }
    }

    pub fn is_already_applied(&self) -> bool {
        matches!(self, ServerResponse::AlreadyApplied)
    }
}

/// Logical entity an attempt writes. Attempts sharing a claim supersede each
/// other; the newest one to succeed owns the final state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Claim(String);

impl Claim {
    pub fn follow(user_id: &UserId) -> Self {
        Self(format!("follow:{user_id}"))
    }

    pub fn post_like(post_id: &PostId) -> Self {
        Self(format!("post-like:{post_id}"))
    }

    pub fn comment_like(comment_id: &CommentId) -> Self {
        Self(format!("comment-like:{comment_id}"))
    }

    pub fn comment_edit(comment_id: &CommentId) -> Self {
        Self(format!("comment-edit:{comment_id}"))
    }

    /// Deletion is terminal, so it never shares a claim with edits.
    pub fn comment_delete(comment_id: &CommentId) -> Self {
        Self(format!("comment-delete:{comment_id}"))
    }

    pub fn post_edit(post_id: &PostId) -> Self {
        Self(format!("post-edit:{post_id}"))
    }

    pub fn post_delete(post_id: &PostId) -> Self {
        Self(format!("post-delete:{post_id}"))
    }

    pub fn comment_create(token: &IdempotencyToken) -> Self {
        Self(format!("comment-create:{token}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait ActionAdapter: Send + Sync {
    fn kind(&self) -> ActionKind;

    fn claim(&self, ctx: &AttemptContext, target: &TargetId) -> Claim;

    /// Rejects the action before any cache mutation or network call.
    fn precheck(&self, _viewer: &UserId, _target: &TargetId) -> Result<(), MutationError> {
        Ok(())
    }

    fn affected_keys(&self, target: &TargetId) -> Vec<KeySelector>;

    /// Read-only views refreshed lazily after success.
    fn dependent_keys(&self, _target: &TargetId) -> Vec<KeySelector> {
        Vec::new()
    }

    /// Total over every key matched by `affected_keys`; keys the action does
    /// not change come back as-is.
    fn optimistic_patch(
        &self,
        ctx: &AttemptContext,
        target: &TargetId,
        key: &CacheKey,
        prior: &CacheValue,
    ) -> CacheValue;

    /// Applies the confirmed action to `base`, the value observed before any
    /// pending attempt, using the server's answer where it has one.
    fn reconcile(
        &self,
        ctx: &AttemptContext,
        target: &TargetId,
        key: &CacheKey,
        base: &CacheValue,
        response: &ServerResponse,
    ) -> CacheValue;

    fn invoke(&self, target: &TargetId, token: &IdempotencyToken) -> ApiRequest;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn ctx(token: &str, viewer: &str) -> AttemptContext {
        AttemptContext {
            token: IdempotencyToken::new(token.to_string()).unwrap(),
            viewer: UserId::new(viewer.to_string()).unwrap(),
            started_at: DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    pub fn target(id: &str) -> TargetId {
        TargetId::new(id.to_string()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct CountPayload {
        like_count: Option<u32>,
    }

    #[test]
    fn payload_falls_back_to_default_when_absent_or_malformed() {
        let confirmed = ServerResponse::Confirmed(json!({ "likeCount": 4 }));
        assert_eq!(confirmed.payload::<CountPayload>().like_count, Some(4));

        let empty = ServerResponse::Confirmed(Value::Null);
        assert_eq!(empty.payload::<CountPayload>(), CountPayload::default());

        let malformed = ServerResponse::Confirmed(json!({ "likeCount": "many" }));
        assert_eq!(malformed.payload::<CountPayload>(), CountPayload::default());

        assert_eq!(
            ServerResponse::AlreadyApplied.payload::<CountPayload>(),
            CountPayload::default()
        );
    }

    #[test]
    fn follow_and_unfollow_share_a_claim() {
        let user = UserId::new("u1".to_string()).unwrap();
        assert_eq!(Claim::follow(&user).as_str(), "follow:u1");
        assert_ne!(
            Claim::comment_create(&IdempotencyToken::new("a".to_string()).unwrap()),
            Claim::comment_create(&IdempotencyToken::new("b".to_string()).unwrap())
        );
    }

    #[test]
    fn edits_and_deletes_claim_separately() {
        let comment = CommentId::new("c1".to_string()).unwrap();
        assert_ne!(Claim::comment_edit(&comment), Claim::comment_delete(&comment));
        let post = PostId::new("p1".to_string()).unwrap();
        assert_ne!(Claim::post_edit(&post), Claim::post_delete(&post));
    }
}
