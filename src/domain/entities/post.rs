use super::engagement::EngagementSummary;
use crate::domain::value_objects::{PostId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_deleted: bool,
}

impl Post {
    pub fn edited(self, content: String, edited_at: DateTime<Utc>) -> Self {
        Self {
            content,
            edited_at: Some(edited_at),
            ..self
        }
    }

    pub fn deleted(self) -> Self {
        Self {
            is_deleted: true,
            ..self
        }
    }
}

/// Post card embedded in a feed page, with its own copy of the engagement counters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedPost {
    pub id: PostId,
    pub author_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub edited_at: Option<DateTime<Utc>>,
    pub engagement: EngagementSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub posts: Vec<FeedPost>,
    #[serde(default)]
    pub next_page: Option<u32>,
}

impl FeedPage {
    pub fn new(posts: Vec<FeedPost>) -> Self {
        Self {
            posts,
            next_page: None,
        }
    }

    pub fn contains(&self, post_id: &PostId) -> bool {
        self.posts.iter().any(|post| &post.id == post_id)
    }

    /// Applies `update` to the post with `post_id`; pages without it are returned as-is.
    pub fn map_post<F>(mut self, post_id: &PostId, update: F) -> Self
    where
        F: FnOnce(FeedPost) -> FeedPost,
    {
        if let Some(index) = self.posts.iter().position(|post| &post.id == post_id) {
            let post = self.posts.remove(index);
            self.posts.insert(index, update(post));
        }
        self
    }

    pub fn without_post(mut self, post_id: &PostId) -> Self {
        self.posts.retain(|post| &post.id != post_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_post(id: &str, likes: u32) -> FeedPost {
        FeedPost {
            id: PostId::new(id.to_string()).unwrap(),
            author_id: UserId::new("author".to_string()).unwrap(),
            content: format!("post {id}"),
            created_at: Utc::now(),
            edited_at: None,
            engagement: EngagementSummary::new(likes, false),
        }
    }

    #[test]
    fn map_post_only_touches_the_matching_entry() {
        let page = FeedPage::new(vec![feed_post("p1", 1), feed_post("p2", 5)]);
        let target = PostId::new("p2".to_string()).unwrap();

        let updated = page.map_post(&target, |mut post| {
            post.engagement = post.engagement.liked();
            post
        });

        assert_eq!(updated.posts[0].engagement.like_count, 1);
        assert_eq!(updated.posts[1].engagement, EngagementSummary::new(6, true));
        assert_eq!(updated.posts[1].id, target);
    }

    #[test]
    fn without_post_preserves_order() {
        let page = FeedPage::new(vec![feed_post("p1", 0), feed_post("p2", 0), feed_post("p3", 0)]);
        let page = page.without_post(&PostId::new("p2".to_string()).unwrap());
        let ids: Vec<_> = page.posts.iter().map(|post| post.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p3"]);
    }
}
