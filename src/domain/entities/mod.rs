pub mod cache_value;
pub mod comment;
pub mod engagement;
pub mod follower_summary;
pub mod mutation_attempt;
pub mod post;
pub mod suggestion;

pub use cache_value::CacheValue;
pub use comment::{CommentNode, CommentThread};
pub use engagement::EngagementSummary;
pub use follower_summary::FollowerSummary;
pub use mutation_attempt::{AttemptStatus, MutationAttempt};
pub use post::{FeedPage, FeedPost, Post};
pub use suggestion::SuggestionEntry;
