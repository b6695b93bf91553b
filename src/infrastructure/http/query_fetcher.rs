use crate::application::ports::{
    ApiRequest, CredentialProvider, HttpMethod, QueryFetcher, Transport,
};
use crate::domain::entities::{
    CacheValue, CommentNode, CommentThread, EngagementSummary, FeedPage, FollowerSummary, Post,
    SuggestionEntry,
};
use crate::domain::value_objects::{CacheKey, FeedScope};
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// GET endpoint serving the current value of a cache key.
pub fn fetch_path(key: &CacheKey) -> String {
    match key {
        CacheKey::FollowerSummary { user_id } => format!("/users/{user_id}/followers/summary"),
        CacheKey::SuggestionList => "/users/suggestions".to_string(),
        CacheKey::PostEngagement { post_id } => format!("/posts/{post_id}/engagement"),
        CacheKey::CommentEngagement { comment_id } => {
            format!("/comments/{comment_id}/engagement")
        }
        CacheKey::Post { post_id } => format!("/posts/{post_id}"),
        CacheKey::FeedPage { scope, page } => match scope {
            FeedScope::Home => format!("/feed/home?page={page}"),
            FeedScope::Following => format!("/feed/following?page={page}"),
            FeedScope::Author(user_id) => format!("/users/{user_id}/posts?page={page}"),
        },
        CacheKey::CommentList { post_id } => format!("/posts/{post_id}/comments"),
    }
}

/// Decodes a response payload into the value shape of `key`.
pub fn decode(key: &CacheKey, payload: Value) -> Result<CacheValue, AppError> {
    let value = match key {
        CacheKey::FollowerSummary { .. } => {
            CacheValue::FollowerSummary(serde_json::from_value::<FollowerSummary>(payload)?)
        }
        CacheKey::SuggestionList => {
            CacheValue::SuggestionList(serde_json::from_value::<Vec<SuggestionEntry>>(payload)?)
        }
        CacheKey::PostEngagement { .. } => {
            CacheValue::PostEngagement(serde_json::from_value::<EngagementSummary>(payload)?)
        }
        CacheKey::CommentEngagement { .. } => {
            CacheValue::CommentEngagement(serde_json::from_value::<EngagementSummary>(payload)?)
        }
        CacheKey::Post { .. } => CacheValue::Post(serde_json::from_value::<Post>(payload)?),
        CacheKey::FeedPage { .. } => {
            CacheValue::FeedPage(serde_json::from_value::<FeedPage>(payload)?)
        }
        CacheKey::CommentList { .. } => CacheValue::CommentList(CommentThread::new(
            serde_json::from_value::<Vec<CommentNode>>(payload)?,
        )),
    };
    Ok(value)
}

/// Background reads over the same `Transport` mutations use.
pub struct HttpQueryFetcher {
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpQueryFetcher {
    pub fn new(transport: Arc<dyn Transport>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            transport,
            credentials,
        }
    }
}

#[async_trait]
impl QueryFetcher for HttpQueryFetcher {
    async fn fetch(&self, key: &CacheKey) -> Result<CacheValue, AppError> {
        let mut request = ApiRequest::new(HttpMethod::Get, fetch_path(key));
        // Viewer-relative flags need the session; anonymous reads are still allowed.
        if let Some(bearer) = self.credentials.bearer_or_null() {
            request = request.with_bearer(&bearer);
        }
        let payload = self.transport.send(request).await?;
        decode(key, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{PostId, UserId};
    use crate::shared::error::TransportError;
    use mockall::mock;
    use serde_json::json;

    mock! {
        pub Transport {}

        #[async_trait]
        impl Transport for Transport {
            async fn send(&self, request: ApiRequest) -> Result<Value, TransportError>;
        }
    }

    struct Anonymous;

    impl CredentialProvider for Anonymous {
        fn bearer_or_null(&self) -> Option<String> {
            None
        }

        fn viewer_id(&self) -> Option<UserId> {
            None
        }
    }

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    #[test]
    fn every_key_kind_maps_to_an_endpoint() {
        let post = PostId::new("p1".to_string()).unwrap();
        assert_eq!(
            fetch_path(&CacheKey::follower_summary(&user("u1"))),
            "/users/u1/followers/summary"
        );
        assert_eq!(fetch_path(&CacheKey::SuggestionList), "/users/suggestions");
        assert_eq!(
            fetch_path(&CacheKey::feed_page(FeedScope::Author(user("u3")), 2)),
            "/users/u3/posts?page=2"
        );
        assert_eq!(
            fetch_path(&CacheKey::feed_page(FeedScope::Following, 0)),
            "/feed/following?page=0"
        );
        assert_eq!(fetch_path(&CacheKey::comment_list(&post)), "/posts/p1/comments");
    }

    #[test]
    fn decode_rejects_payloads_of_the_wrong_shape() {
        let err = decode(
            &CacheKey::follower_summary(&user("u1")),
            json!({ "likeCount": 1 }),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::DeserializationError(_)));
    }

    #[tokio::test]
    async fn fetch_decodes_follower_summary() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|request| {
                request.method == HttpMethod::Get
                    && request.path == "/users/u1/followers/summary"
                    && request.headers.is_empty()
            })
            .times(1)
            .returning(|_| Ok(json!({ "followerCount": 12, "isFollowedByViewer": true })));

        let fetcher = HttpQueryFetcher::new(Arc::new(transport), Arc::new(Anonymous));
        let value = fetcher
            .fetch(&CacheKey::follower_summary(&user("u1")))
            .await
            .unwrap();
        assert_eq!(
            value,
            CacheValue::FollowerSummary(FollowerSummary::new(12, true))
        );
    }

    #[tokio::test]
    async fn missing_resources_surface_as_not_found() {
        let mut transport = MockTransport::new();
        transport.expect_send().returning(|_| {
            Err(TransportError::Http {
                status: 404,
                body: "no such post".to_string(),
            })
        });

        let fetcher = HttpQueryFetcher::new(Arc::new(transport), Arc::new(Anonymous));
        let err = fetcher
            .fetch(&CacheKey::post(&PostId::new("p9".to_string()).unwrap()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
