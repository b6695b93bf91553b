use crate::application::ports::CredentialProvider;
use crate::domain::value_objects::UserId;
use std::sync::RwLock;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub viewer_id: UserId,
    pub bearer: String,
}

/// In-memory session holder fed by the host application's sign-in flow.
#[derive(Debug, Default)]
pub struct SessionCredentials {
    session: RwLock<Option<Session>>,
}

impl SessionCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(viewer_id: UserId, bearer: impl Into<String>) -> Self {
        let credentials = Self::new();
        credentials.sign_in(viewer_id, bearer);
        credentials
    }

    pub fn sign_in(&self, viewer_id: UserId, bearer: impl Into<String>) {
        info!(viewer = %viewer_id, "session started");
        let mut session = self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *session = Some(Session {
            viewer_id,
            bearer: bearer.into(),
        });
    }

    pub fn sign_out(&self) {
        let mut session = self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if session.take().is_some() {
            info!("session cleared");
        }
    }

    fn current(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl CredentialProvider for SessionCredentials {
    fn bearer_or_null(&self) -> Option<String> {
        self.current()
            .map(|session| session.bearer)
            .filter(|bearer| !bearer.trim().is_empty())
    }

    fn viewer_id(&self) -> Option<UserId> {
        self.current().map(|session| session.viewer_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_follow_the_session() {
        let credentials = SessionCredentials::new();
        assert_eq!(credentials.bearer_or_null(), None);

        let viewer = UserId::new("u1".to_string()).unwrap();
        credentials.sign_in(viewer.clone(), "token-1");
        assert_eq!(credentials.bearer_or_null().as_deref(), Some("token-1"));
        assert_eq!(credentials.viewer_id(), Some(viewer));

        credentials.sign_out();
        assert_eq!(credentials.bearer_or_null(), None);
        assert_eq!(credentials.viewer_id(), None);
    }

    #[test]
    fn blank_bearer_counts_as_signed_out() {
        let credentials = SessionCredentials::signed_in(UserId::new("u1".to_string()).unwrap(), " ");
        assert_eq!(credentials.bearer_or_null(), None);
    }
}
