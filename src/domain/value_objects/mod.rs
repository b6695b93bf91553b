pub mod action_kind;
pub mod cache_key;
pub mod idempotency_token;
pub mod ids;

pub use action_kind::ActionKind;
pub use cache_key::{CacheKey, CacheKind, FeedScope, KeySelector};
pub use idempotency_token::IdempotencyToken;
pub use ids::{CommentId, PostId, TargetId, UserId};
