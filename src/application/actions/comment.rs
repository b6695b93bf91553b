use super::{ActionAdapter, AttemptContext, Claim, ServerResponse};
use crate::application::ports::{ApiRequest, HttpMethod};
use crate::domain::entities::{CacheValue, CommentNode, EngagementSummary, FeedPost};
use crate::domain::value_objects::{
    ActionKind, CacheKey, CacheKind, CommentId, IdempotencyToken, KeySelector, PostId, TargetId,
    UserId,
};
use crate::shared::error::MutationError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedPayload {
    id: Option<CommentId>,
    created_at: Option<DateTime<Utc>>,
    comment_count: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EditedPayload {
    content: Option<String>,
    edited_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeletedPayload {
    comment_count: Option<u32>,
}

fn require_content(content: &str) -> Result<(), MutationError> {
    if content.trim().is_empty() {
        return Err(MutationError::InvalidOperation(
            "Comment content cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Applies `update` to the post's standalone engagement and to its feed cards.
fn update_post_counts<F>(post_id: &PostId, value: &CacheValue, update: F) -> CacheValue
where
    F: Fn(EngagementSummary) -> EngagementSummary,
{
    match value {
        CacheValue::PostEngagement(summary) => CacheValue::PostEngagement(update(*summary)),
        CacheValue::FeedPage(page) => {
            CacheValue::FeedPage(page.clone().map_post(post_id, |post| FeedPost {
                engagement: update(post.engagement),
                ..post
            }))
        }
        other => other.clone(),
    }
}

fn with_server_count(summary: EngagementSummary, comment_count: Option<u32>) -> EngagementSummary {
    match comment_count {
        Some(count) => summary.with_comment_count(count),
        None => summary,
    }
}

fn post_count_keys(post_id: &PostId) -> Vec<KeySelector> {
    vec![
        KeySelector::Exact(CacheKey::post_engagement(post_id)),
        KeySelector::Kind(CacheKind::FeedPage),
    ]
}

/// Adds a comment (or a reply) to a post. The node is shown under a
/// temporary id until the server issues the real one.
#[derive(Debug, Clone)]
pub struct CreateCommentAdapter {
    content: String,
    parent_id: Option<CommentId>,
}

impl CreateCommentAdapter {
    pub fn new(content: impl Into<String>, parent_id: Option<CommentId>) -> Self {
        Self {
            content: content.into(),
            parent_id,
        }
    }

    fn draft(&self, ctx: &AttemptContext) -> CommentNode {
        CommentNode::new(
            CommentId::temporary(&ctx.token),
            ctx.viewer.clone(),
            self.content.trim().to_string(),
            ctx.started_at,
        )
    }
}

impl ActionAdapter for CreateCommentAdapter {
    fn kind(&self) -> ActionKind {
        ActionKind::CreateComment
    }

    // Independent creations never supersede each other.
    fn claim(&self, ctx: &AttemptContext, _target: &TargetId) -> Claim {
        Claim::comment_create(&ctx.token)
    }

    fn precheck(&self, _viewer: &UserId, _target: &TargetId) -> Result<(), MutationError> {
        require_content(&self.content)
    }

    fn affected_keys(&self, target: &TargetId) -> Vec<KeySelector> {
        let post_id = target.as_post_id();
        let mut keys = vec![KeySelector::Exact(CacheKey::comment_list(&post_id))];
        keys.extend(post_count_keys(&post_id));
        keys
    }

    // A reply whose parent is missing from the cached thread still bumps the
    // count, so both views are refreshed once the server has answered.
    fn dependent_keys(&self, target: &TargetId) -> Vec<KeySelector> {
        if self.parent_id.is_none() {
            return Vec::new();
        }
        let post_id = target.as_post_id();
        vec![
            KeySelector::Exact(CacheKey::comment_list(&post_id)),
            KeySelector::Exact(CacheKey::post_engagement(&post_id)),
        ]
    }

    fn optimistic_patch(
        &self,
        ctx: &AttemptContext,
        target: &TargetId,
        _key: &CacheKey,
        prior: &CacheValue,
    ) -> CacheValue {
        match prior {
            CacheValue::CommentList(thread) => CacheValue::CommentList(
                thread
                    .clone()
                    .with_comment(self.draft(ctx), self.parent_id.as_ref()),
            ),
            other => update_post_counts(&target.as_post_id(), other, |summary| {
                summary.comment_added()
            }),
        }
    }

    fn reconcile(
        &self,
        ctx: &AttemptContext,
        target: &TargetId,
        key: &CacheKey,
        base: &CacheValue,
        response: &ServerResponse,
    ) -> CacheValue {
        let payload: CreatedPayload = response.payload();
        let optimistic = self.optimistic_patch(ctx, target, key, base);
        match optimistic {
            CacheValue::CommentList(thread) => match payload.id {
                Some(issued) => CacheValue::CommentList(thread.with_replaced_id(
                    &CommentId::temporary(&ctx.token),
                    issued,
                    payload.created_at,
                )),
                None => CacheValue::CommentList(thread),
            },
            other => update_post_counts(&target.as_post_id(), &other, |summary| {
                with_server_count(summary, payload.comment_count)
            }),
        }
    }

    fn invoke(&self, target: &TargetId, token: &IdempotencyToken) -> ApiRequest {
        let mut body = json!({ "content": self.content.trim() });
        if let Some(parent_id) = &self.parent_id {
            body["parentId"] = json!(parent_id.as_str());
        }
        ApiRequest::new(
            HttpMethod::Post,
            format!("/posts/{}/comments", target.as_str()),
        )
        .with_body(body)
        .with_idempotency_key(token)
    }
}

#[derive(Debug, Clone)]
pub struct EditCommentAdapter {
    post_id: PostId,
    content: String,
}

impl EditCommentAdapter {
    pub fn new(post_id: PostId, content: impl Into<String>) -> Self {
        Self {
            post_id,
            content: content.into(),
        }
    }

    fn edit(
        &self,
        target: &TargetId,
        value: &CacheValue,
        content: String,
        at: DateTime<Utc>,
    ) -> CacheValue {
        match value {
            CacheValue::CommentList(thread) => CacheValue::CommentList(
                thread
                    .clone()
                    .map_comment(&target.as_comment_id(), |node| node.edited(content, at)),
            ),
            other => other.clone(),
        }
    }
}

impl ActionAdapter for EditCommentAdapter {
    fn kind(&self) -> ActionKind {
        ActionKind::EditComment
    }

    fn claim(&self, _ctx: &AttemptContext, target: &TargetId) -> Claim {
        Claim::comment_edit(&target.as_comment_id())
    }

    fn precheck(&self, _viewer: &UserId, _target: &TargetId) -> Result<(), MutationError> {
        require_content(&self.content)
    }

    fn affected_keys(&self, _target: &TargetId) -> Vec<KeySelector> {
        vec![KeySelector::Exact(CacheKey::comment_list(&self.post_id))]
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
        ApiRequest::new(HttpMethod::Patch, format!("/comments/{}", target.as_str()))
            .with_body(json!({ "content": self.content.trim() }))
            .with_idempotency_key(token)
    }
}

/// Removes a comment with its replies and decrements the post's comment count.
#[derive(Debug, Clone)]
pub struct DeleteCommentAdapter {
    post_id: PostId,
}

impl DeleteCommentAdapter {
    pub fn new(post_id: PostId) -> Self {
        Self { post_id }
    }
}

impl ActionAdapter for DeleteCommentAdapter {
    fn kind(&self) -> ActionKind {
        ActionKind::DeleteComment
    }

    fn claim(&self, _ctx: &AttemptContext, target: &TargetId) -> Claim {
        Claim::comment_delete(&target.as_comment_id())
    }

    fn affected_keys(&self, _target: &TargetId) -> Vec<KeySelector> {
        let mut keys = vec![KeySelector::Exact(CacheKey::comment_list(&self.post_id))];
        keys.extend(post_count_keys(&self.post_id));
        keys
    }

    fn optimistic_patch(
        &self,
        _ctx: &AttemptContext,
        target: &TargetId,
        _key: &CacheKey,
        prior: &CacheValue,
    ) -> CacheValue {
        match prior {
            CacheValue::CommentList(thread) => {
                CacheValue::CommentList(thread.clone().without_comment(&target.as_comment_id()))
            }
            other => update_post_counts(&self.post_id, other, |summary| summary.comment_removed()),
        }
    }

    fn reconcile(
        &self,
        ctx: &AttemptContext,
        target: &TargetId,
        key: &CacheKey,
        base: &CacheValue,
        response: &ServerResponse,
    ) -> CacheValue {
        let payload: DeletedPayload = response.payload();
        let optimistic = self.optimistic_patch(ctx, target, key, base);
        update_post_counts(&self.post_id, &optimistic, |summary| {
            with_server_count(summary, payload.comment_count)
        })
    }

    fn invoke(&self, target: &TargetId, token: &IdempotencyToken) -> ApiRequest {
        ApiRequest::new(HttpMethod::Delete, format!("/comments/{}", target.as_str()))
            .with_idempotency_key(token)
    }
}
