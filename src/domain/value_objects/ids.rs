use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::IdempotencyToken;

const TEMPORARY_COMMENT_PREFIX: &str = "temp-";

fn validate(value: &str, label: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{label} cannot be empty"));
    }
    if value.contains(':') || value.contains('/') {
        return Err(format!("{label} cannot contain ':' or '/'"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: String) -> Result<Self, String> {
        validate(&value, "User ID")?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PostId(String);

impl PostId {
    pub fn new(value: String) -> Result<Self, String> {
        validate(&value, "Post ID")?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommentId(String);

impl CommentId {
    pub fn new(value: String) -> Result<Self, String> {
        validate(&value, "Comment ID")?;
        Ok(Self(value))
    }

    /// Placeholder id for a comment the server has not issued yet.
    pub fn temporary(token: &IdempotencyToken) -> Self {
        Self(format!("{TEMPORARY_COMMENT_PREFIX}{}", token.as_str()))
    }

    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMPORARY_COMMENT_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Untyped id handed to `perform`; each adapter reads it as the id kind it acts on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetId(String);

impl TargetId {
    pub fn new(value: String) -> Result<Self, String> {
        validate(&value, "Target ID")?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_user_id(&self) -> UserId {
        UserId(self.0.clone())
    }

    pub fn as_post_id(&self) -> PostId {
        PostId(self.0.clone())
    }

    pub fn as_comment_id(&self) -> CommentId {
        CommentId(self.0.clone())
    }
}

macro_rules! string_id_impls {
    ($($name:ident),*) => {
        $(
            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl FromStr for $name {
                type Err = String;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    Self::new(s.to_string())
                }
            }

            impl From<$name> for String {
                fn from(id: $name) -> Self {
                    id.0
                }
            }
        )*
    };
}

string_id_impls!(UserId, PostId, CommentId, TargetId);

impl From<&UserId> for TargetId {
    fn from(id: &UserId) -> Self {
        TargetId(id.0.clone())
    }
}

impl From<&PostId> for TargetId {
    fn from(id: &PostId) -> Self {
        TargetId(id.0.clone())
    }
}

impl From<&CommentId> for TargetId {
    fn from(id: &CommentId) -> Self {
        TargetId(id.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_separator_ids() {
        assert!(UserId::new("".to_string()).is_err());
        assert!(UserId::new("   ".to_string()).is_err());
        assert!(PostId::new("a:b".to_string()).is_err());
        assert!(CommentId::new("a/b".to_string()).is_err());
        assert!("u1".parse::<UserId>().is_ok());
    }

    #[test]
    fn temporary_comment_ids_are_recognisable() {
        let token = IdempotencyToken::new("tok-1".to_string()).unwrap();
        let id = CommentId::temporary(&token);
        assert!(id.is_temporary());
        assert_eq!(id.as_str(), "temp-tok-1");
        assert!(!CommentId::new("c1".to_string()).unwrap().is_temporary());
    }

    #[test]
    fn target_converts_to_typed_ids() {
        let target: TargetId = "42".parse().unwrap();
        assert_eq!(target.as_user_id().as_str(), "42");
        assert_eq!(target.as_post_id().as_str(), "42");
        assert_eq!(TargetId::from(&target.as_comment_id()), target);
    }
}
