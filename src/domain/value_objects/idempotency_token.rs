use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque per-attempt token sent as the `Idempotency-Key` header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdempotencyToken(String);

impl IdempotencyToken {
    pub fn new(value: String) -> Result<Self, String> {
        Self::validate(&value)?;
        Ok(Self(value))
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(value: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            return Err("Idempotency token cannot be empty".to_string());
        }
        if value.contains(':') || value.contains('/') {
            return Err("Idempotency token cannot contain ':' or '/'".to_string());
        }
        Ok(())
    }
}

impl fmt::Display for IdempotencyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<IdempotencyToken> for String {
    fn from(value: IdempotencyToken) -> Self {
        value.0
    }
}
