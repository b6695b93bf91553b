use crate::application::ports::IdempotencyTokenSource;
use crate::domain::value_objects::IdempotencyToken;

/// Random v4 UUIDs; tokens carry no meaning beyond uniqueness.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidTokenSource;

impl IdempotencyTokenSource for UuidTokenSource {
    fn next(&self) -> IdempotencyToken {
        IdempotencyToken::generate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issues_a_fresh_token_per_call() {
        let source = UuidTokenSource;
        assert_ne!(source.next(), source.next());
    }
}
