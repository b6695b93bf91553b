use crate::domain::value_objects::UserId;

/// Session collaborator; the engine asks on every call and never caches the answer.
pub trait CredentialProvider: Send + Sync {
    fn bearer_or_null(&self) -> Option<String>;

    fn viewer_id(&self) -> Option<UserId>;
}
