use super::{ActionAdapter, AttemptContext, Claim, ServerResponse};
use crate::application::ports::{ApiRequest, HttpMethod};
use crate::domain::entities::{CacheValue, EngagementSummary, FeedPost};
use crate::domain::value_objects::{
    ActionKind, CacheKey, CacheKind, IdempotencyToken, KeySelector, PostId, TargetId,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LikePayload {
    like_count: Option<u32>,
}

fn toggled(summary: EngagementSummary, like: bool) -> EngagementSummary {
    if like {
        summary.liked()
    } else {
        summary.unliked()
    }
}

/// Folds the server answer into an engagement summary that has not seen this
/// attempt yet.
fn reconciled(summary: EngagementSummary, like: bool, response: &ServerResponse) -> EngagementSummary {
    match response {
        ServerResponse::AlreadyApplied => summary.with_liked(like),
        ServerResponse::Confirmed(_) => {
            let payload: LikePayload = response.payload();
            let optimistic = toggled(summary, like);
            match payload.like_count {
                Some(count) => optimistic.with_like_count(count),
                None => optimistic,
            }
        }
    }
}

fn like_method(like: bool) -> HttpMethod {
    if like {
        HttpMethod::Post
    } else {
        HttpMethod::Delete
    }
}

/// Like or unlike a post: the standalone engagement summary and every feed
/// page card showing the post.
#[derive(Debug, Clone, Copy)]
pub struct PostLikeAdapter {
    like: bool,
}

impl PostLikeAdapter {
    pub fn like() -> Self {
        Self { like: true }
    }

    pub fn unlike() -> Self {
        Self { like: false }
    }

    fn update<F>(&self, target: &TargetId, value: &CacheValue, update: F) -> CacheValue
    where
        F: Fn(EngagementSummary) -> EngagementSummary,
    {
        match value {
            CacheValue::PostEngagement(summary) => CacheValue::PostEngagement(update(*summary)),
            CacheValue::FeedPage(page) => {
                CacheValue::FeedPage(page.clone().map_post(&target.as_post_id(), |post| {
                    FeedPost {
                        engagement: update(post.engagement),
                        ..post
                    }
                }))
            }
            other => other.clone(),
        }
    }
}

impl ActionAdapter for PostLikeAdapter {
    fn kind(&self) -> ActionKind {
        if self.like {
            ActionKind::LikePost
        } else {
            ActionKind::UnlikePost
        }
    }

    fn claim(&self, _ctx: &AttemptContext, target: &TargetId) -> Claim {
        Claim::post_like(&target.as_post_id())
    }

    fn affected_keys(&self, target: &TargetId) -> Vec<KeySelector> {
        vec![
            KeySelector::Exact(CacheKey::post_engagement(&target.as_post_id())),
            KeySelector::Kind(CacheKind::FeedPage),
        ]
    }

    fn optimistic_patch(
        &self,
        _ctx: &AttemptContext,
        target: &TargetId,
        _key: &CacheKey,
        prior: &CacheValue,
    ) -> CacheValue {
        self.update(target, prior, |summary| toggled(summary, self.like))
    }

    fn reconcile(
        &self,
        _ctx: &AttemptContext,
        target: &TargetId,
        _key: &CacheKey,
        base: &CacheValue,
        response: &ServerResponse,
    ) -> CacheValue {
        self.update(target, base, |summary| {
            reconciled(summary, self.like, response)
        })
    }

    fn invoke(&self, target: &TargetId, token: &IdempotencyToken) -> ApiRequest {
        ApiRequest::new(
            like_method(self.like),
            format!("/posts/{}/like", target.as_str()),
        )
        .with_idempotency_key(token)
    }
}

/// Like or unlike a comment: its engagement summary and the node inside the
/// post's comment list.
#[derive(Debug, Clone)]
pub struct CommentLikeAdapter {
    like: bool,
    post_id: PostId,
}

impl CommentLikeAdapter {
    pub fn like(post_id: PostId) -> Self {
        Self {
            like: true,
            post_id,
        }
    }

    pub fn unlike(post_id: PostId) -> Self {
        Self {
            like: false,
            post_id,
        }
    }

    fn update<F>(&self, target: &TargetId, value: &CacheValue, update: F) -> CacheValue
    where
        F: Fn(EngagementSummary) -> EngagementSummary,
    {
        match value {
            CacheValue::CommentEngagement(summary) => {
                CacheValue::CommentEngagement(update(*summary))
            }
            CacheValue::CommentList(thread) => CacheValue::CommentList(
                thread
                    .clone()
                    .map_comment(&target.as_comment_id(), |mut node| {
                        let summary = update(EngagementSummary::new(
                            node.like_count,
                            node.is_liked_by_viewer,
                        ));
                        node.like_count = summary.like_count;
                        node.is_liked_by_viewer = summary.is_liked_by_viewer;
                        node
                    }),
            ),
            other => other.clone(),
        }
    }
}

impl ActionAdapter for CommentLikeAdapter {
    fn kind(&self) -> ActionKind {
        if self.like {
            ActionKind::LikeComment
        } else {
            ActionKind::UnlikeComment
        }
    }

    fn claim(&self, _ctx: &AttemptContext, target: &TargetId) -> Claim {
        Claim::comment_like(&target.as_comment_id())
    }

    fn affected_keys(&self, target: &TargetId) -> Vec<KeySelector> {
        vec![
            KeySelector::Exact(CacheKey::comment_engagement(&target.as_comment_id())),
            KeySelector::Exact(CacheKey::comment_list(&self.post_id)),
        ]
    }

    fn optimistic_patch(
        &self,
        _ctx: &AttemptContext,
        target: &TargetId,
        _key: &CacheKey,
        prior: &CacheValue,
    ) -> CacheValue {
        self.update(target, prior, |summary| toggled(summary, self.like))
    }

    fn reconcile(
        &self,
        _ctx: &AttemptContext,
        target: &TargetId,
        _key: &CacheKey,
        base: &CacheValue,
        response: &ServerResponse,
    ) -> CacheValue {
        self.update(target, base, |summary| {
            reconciled(summary, self.like, response)
        })
    }

    fn invoke(&self, target: &TargetId, token: &IdempotencyToken) -> ApiRequest {
        ApiRequest::new(
            like_method(self.like),
            format!("/comments/{}/like", target.as_str()),
        )
        .with_idempotency_key(token)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{ctx, target};
    use super::*;
    use crate::domain::entities::{CommentNode, CommentThread, FeedPage};
    use crate::domain::value_objects::{CommentId, FeedScope, UserId};
    use chrono::Utc;
    use serde_json::json;

    fn feed_post(id: &str, likes: u32, liked: bool) -> FeedPost {
        FeedPost {
            id: PostId::new(id.to_string()).unwrap(),
            author_id: UserId::new("author".to_string()).unwrap(),
            content: format!("post {id}"),
            created_at: Utc::now(),
            edited_at: None,
            engagement: EngagementSummary::new(likes, liked),
        }
    }

    fn page() -> CacheValue {
        CacheValue::FeedPage(FeedPage::new(vec![
            feed_post("p1", 3, false),
            feed_post("p2", 8, false),
        ]))
    }

    #[test]
    fn liking_a_post_updates_the_matching_feed_card_only() {
        let adapter = PostLikeAdapter::like();
        let key = CacheKey::feed_page(FeedScope::Home, 0);
        let patched = adapter.optimistic_patch(&ctx("t", "v"), &target("p2"), &key, &page());

        let page = patched.as_feed_page().unwrap();
        assert_eq!(page.posts[0].engagement, EngagementSummary::new(3, false));
        assert_eq!(page.posts[1].engagement, EngagementSummary::new(9, true));
    }

    #[test]
    fn post_like_reconcile_uses_server_count() {
        let adapter = PostLikeAdapter::like();
        let key = CacheKey::post_engagement(&PostId::new("p1".to_string()).unwrap());
        let base = CacheValue::PostEngagement(EngagementSummary::new(3, false).with_comment_count(2));
        let reconciled = adapter.reconcile(
            &ctx("t", "v"),
            &target("p1"),
            &key,
            &base,
            &ServerResponse::Confirmed(json!({ "likeCount": 10 })),
        );
        assert_eq!(
            reconciled,
            CacheValue::PostEngagement(EngagementSummary::new(10, true).with_comment_count(2))
        );
    }

    #[test]
    fn unlike_conflict_only_clears_the_flag() {
        let adapter = PostLikeAdapter::unlike();
        let key = CacheKey::post_engagement(&PostId::new("p1".to_string()).unwrap());
        let base = CacheValue::PostEngagement(EngagementSummary::new(3, true));
        let reconciled = adapter.reconcile(
            &ctx("t", "v"),
            &target("p1"),
            &key,
            &base,
            &ServerResponse::AlreadyApplied,
        );
        assert_eq!(
            reconciled,
            CacheValue::PostEngagement(EngagementSummary::new(3, false))
        );
    }

    #[test]
    fn liking_a_reply_updates_the_node_inside_the_thread() {
        let post_id = PostId::new("p1".to_string()).unwrap();
        let author = UserId::new("a".to_string()).unwrap();
        let root = CommentNode::new(
            CommentId::new("c1".to_string()).unwrap(),
            author.clone(),
            "root".to_string(),
            Utc::now(),
        );
        let reply = CommentNode::new(
            CommentId::new("c2".to_string()).unwrap(),
            author,
            "reply".to_string(),
            Utc::now(),
        );
        let thread = CommentThread::new(vec![root])
            .with_comment(reply, Some(&CommentId::new("c1".to_string()).unwrap()));

        let adapter = CommentLikeAdapter::like(post_id.clone());
        let patched = adapter.optimistic_patch(
            &ctx("t", "v"),
            &target("c2"),
            &CacheKey::comment_list(&post_id),
            &CacheValue::CommentList(thread),
        );

        let node = patched
            .as_comment_thread()
            .and_then(|thread| thread.find(&CommentId::new("c2".to_string()).unwrap()))
            .cloned()
            .unwrap();
        assert_eq!(node.like_count, 1);
        assert!(node.is_liked_by_viewer);
    }

    #[test]
    fn comment_like_targets_the_comment_endpoint() {
        let adapter = CommentLikeAdapter::unlike(PostId::new("p1".to_string()).unwrap());
        let token = IdempotencyToken::new("tok".to_string()).unwrap();
        let request = adapter.invoke(&target("c9"), &token);
        assert_eq!(request.method, HttpMethod::Delete);
        assert_eq!(request.path, "/comments/c9/like");
        assert_eq!(request.idempotency_key(), Some("tok"));
    }
}
