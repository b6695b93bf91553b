use super::{ActionAdapter, AttemptContext, Claim, ServerResponse};
use crate::application::ports::{ApiRequest, HttpMethod};
use crate::domain::entities::{CacheValue, FeedPost};
use crate::domain::value_objects::{
    ActionKind, CacheKey, CacheKind, IdempotencyToken, KeySelector, TargetId, UserId,
};
use crate::shared::error::MutationError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EditedPayload {
    content: Option<String>,
    edited_at: Option<DateTime<Utc>>,
}

fn post_keys(target: &TargetId) -> Vec<KeySelector> {
    vec![
        KeySelector::Exact(CacheKey::post(&target.as_post_id())),
        KeySelector::Kind(CacheKind::FeedPage),
    ]
}

#[derive(Debug, Clone)]
pub struct EditPostAdapter {
    content: String,
}

impl EditPostAdapter {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    fn edit(
        &self,
        target: &TargetId,
        value: &CacheValue,
        content: String,
        edited_at: DateTime<Utc>,
    ) -> CacheValue {
        match value {
            CacheValue::Post(post) => CacheValue::Post(post.clone().edited(content, edited_at)),
            CacheValue::FeedPage(page) => {
                CacheValue::FeedPage(page.clone().map_post(&target.as_post_id(), |post| {
                    FeedPost {
                        content,
                        edited_at: Some(edited_at),
                        ..post
                    }
                }))
            }
            other => other.clone(),
        }
    }
}

impl ActionAdapter for EditPostAdapter {
    fn kind(&self) -> ActionKind {
        ActionKind::EditPost
    }

    fn claim(&self, _ctx: &AttemptContext, target: &TargetId) -> Claim {
        Claim::post_edit(&target.as_post_id())
    }

    fn precheck(&self, _viewer: &UserId, _target: &TargetId) -> Result<(), MutationError> {
        if self.content.trim().is_empty() {
            return Err(MutationError::InvalidOperation(
                "Post content cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn affected_keys(&self, target: &TargetId) -> Vec<KeySelector> {
        post_keys(target)
    }

    fn optimistic_patch(
        &self,
        ctx: &AttemptContext,
        target: &TargetId,
        _key: &CacheKey,
        prior: &CacheValue,
    ) -> CacheValue {
        self.edit(target, prior, self.content.trim().to_string(), ctx.started_at)
    }

    fn reconcile(
        &self,
        ctx: &AttemptContext,
        target: &TargetId,
        _key: &CacheKey,
        base: &CacheValue,
        response: &ServerResponse,
    ) -> CacheValue {
        let payload: EditedPayload = response.payload();
        let content = payload
            .content
            .unwrap_or_else(|| self.content.trim().to_string());
        self.edit(
            target,
            base,
            content,
            payload.edited_at.unwrap_or(ctx.started_at),
        )
    }

    fn invoke(&self, target: &TargetId, token: &IdempotencyToken) -> ApiRequest {
        ApiRequest::new(HttpMethod::Patch, format!("/posts/{}", target.as_str()))
            .with_body(json!({ "content": self.content.trim() }))
            .with_idempotency_key(token)
    }
}

/// Marks the post deleted and drops it from every cached feed page.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeletePostAdapter;

impl ActionAdapter for DeletePostAdapter {
    fn kind(&self) -> ActionKind {
        ActionKind::DeletePost
    }

    fn claim(&self, _ctx: &AttemptContext, target: &TargetId) -> Claim {
        Claim::post_delete(&target.as_post_id())
    }

    fn affected_keys(&self, target: &TargetId) -> Vec<KeySelector> {
        post_keys(target)
    }

    // Pagination shifts once a post disappears.
    fn dependent_keys(&self, _target: &TargetId) -> Vec<KeySelector> {
        vec![KeySelector::Kind(CacheKind::FeedPage)]
    }

    fn optimistic_patch(
        &self,
        _ctx: &AttemptContext,
        target: &TargetId,
        _key: &CacheKey,
        prior: &CacheValue,
    ) -> CacheValue {
        match prior {
            CacheValue::Post(post) => CacheValue::Post(post.clone().deleted()),
            CacheValue::FeedPage(page) => {
                CacheValue::FeedPage(page.clone().without_post(&target.as_post_id()))
            }
            other => other.clone(),
        }
    }

    fn reconcile(
        &self,
        ctx: &AttemptContext,
        target: &TargetId,
        key: &CacheKey,
        base: &CacheValue,
        _response: &ServerResponse,
    ) -> CacheValue {
        self.optimistic_patch(ctx, target, key, base)
    }

    fn invoke(&self, target: &TargetId, token: &IdempotencyToken) -> ApiRequest {
        ApiRequest::new(HttpMethod::Delete, format!("/posts/{}", target.as_str()))
            .with_idempotency_key(token)
    }
}
