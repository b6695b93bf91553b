use crate::domain::value_objects::IdempotencyToken;

/// Issues one fresh token per logical mutation attempt.
pub trait IdempotencyTokenSource: Send + Sync {
    fn next(&self) -> IdempotencyToken;
}
