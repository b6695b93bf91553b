use super::{ActionAdapter, AttemptContext, Claim, ServerResponse};
use crate::application::ports::{ApiRequest, HttpMethod};
use crate::domain::entities::{CacheValue, FollowerSummary};
use crate::domain::value_objects::{
    ActionKind, CacheKey, CacheKind, IdempotencyToken, KeySelector, TargetId, UserId,
};
use crate::shared::error::MutationError;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FollowPayload {
    #[serde(alias = "followingCount")]
    follower_count: Option<u64>,
}

/// Follow or unfollow a user. Both directions share the `follow:<user>` claim.
#[derive(Debug, Clone, Copy)]
pub struct FollowAdapter {
    follow: bool,
}

impl FollowAdapter {
    pub fn follow() -> Self {
        Self { follow: true }
    }

    pub fn unfollow() -> Self {
        Self { follow: false }
    }

    fn apply(&self, summary: FollowerSummary) -> FollowerSummary {
        if self.follow {
            summary.followed()
        } else {
            summary.unfollowed()
        }
    }
}

impl ActionAdapter for FollowAdapter {
    fn kind(&self) -> ActionKind {
        if self.follow {
            ActionKind::Follow
        } else {
            ActionKind::Unfollow
        }
    }

    fn claim(&self, _ctx: &AttemptContext, target: &TargetId) -> Claim {
        Claim::follow(&target.as_user_id())
    }

    fn precheck(&self, viewer: &UserId, target: &TargetId) -> Result<(), MutationError> {
        if viewer.as_str() == target.as_str() {
            return Err(MutationError::InvalidOperation(
                "You cannot follow yourself".to_string(),
            ));
        }
        Ok(())
    }

    // Suggestion entries read the canonical summary, so only the summary is patched.
    fn affected_keys(&self, target: &TargetId) -> Vec<KeySelector> {
        vec![KeySelector::Exact(CacheKey::follower_summary(
            &target.as_user_id(),
        ))]
    }

    fn dependent_keys(&self, _target: &TargetId) -> Vec<KeySelector> {
        vec![
            KeySelector::Kind(CacheKind::SuggestionList),
            KeySelector::prefix("feed-page:following"),
        ]
    }

    fn optimistic_patch(
        &self,
        _ctx: &AttemptContext,
        _target: &TargetId,
        _key: &CacheKey,
        prior: &CacheValue,
    ) -> CacheValue {
        match prior {
            CacheValue::FollowerSummary(summary) => {
                CacheValue::FollowerSummary(self.apply(*summary))
            }
            other => other.clone(),
        }
    }

    fn reconcile(
        &self,
        _ctx: &AttemptContext,
        _target: &TargetId,
        _key: &CacheKey,
        base: &CacheValue,
        response: &ServerResponse,
    ) -> CacheValue {
        let CacheValue::FollowerSummary(summary) = base else {
            return base.clone();
        };
        let reconciled = match response {
            // Already in the target state: the count cannot be inferred, only the flag.
            ServerResponse::AlreadyApplied => {
                FollowerSummary::new(summary.follower_count, self.follow)
            }
            ServerResponse::Confirmed(_) => {
                let payload: FollowPayload = response.payload();
                let optimistic = self.apply(*summary);
                match payload.follower_count {
                    Some(count) => optimistic.with_follower_count(count),
                    None => optimistic,
                }
            }
        };
        CacheValue::FollowerSummary(reconciled)
    }

    fn invoke(&self, target: &TargetId, token: &IdempotencyToken) -> ApiRequest {
        let method = if self.follow {
            HttpMethod::Post
        } else {
            HttpMethod::Delete
        };
        ApiRequest::new(method, format!("/users/{}/follow", target.as_str()))
            .with_idempotency_key(token)
    }
}
