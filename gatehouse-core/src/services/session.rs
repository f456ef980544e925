use crate::{
    Error,
    address::SourceAddress,
    repositories::SessionRepository,
    session::{AuthenticatedSession, SessionToken},
    user::{UserId, UserRecord},
};
use chrono::Duration;
use std::sync::Arc;

/// Service for session management operations
pub struct SessionService<R: SessionRepository> {
    repository: Arc<R>,
}

impl<R: SessionRepository> SessionService<R> {
    /// Create a new SessionService with the given repository
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Establish a session for an authenticated user
    pub async fn create_session(
        &self,
        user: &UserRecord,
        source: SourceAddress,
        expires_in: Duration,
    ) -> Result<AuthenticatedSession, Error> {
        let session =
            AuthenticatedSession::establish(user.id.clone(), user.role.clone(), source, expires_in);

        self.repository.create(session).await
    }

    /// Get a session by token. Expired sessions read as absent.
    pub async fn get_session(
        &self,
        token: &SessionToken,
    ) -> Result<Option<AuthenticatedSession>, Error> {
        let session = self.repository.find_by_token(token).await?;

        match session {
            Some(s) if s.is_expired() => Ok(None),
            other => Ok(other),
        }
    }

    /// Delete a session
    pub async fn delete_session(&self, token: &SessionToken) -> Result<(), Error> {
        self.repository.delete(token).await
    }

    /// Delete all sessions for a user
    pub async fn delete_user_sessions(&self, user_id: &UserId) -> Result<(), Error> {
        self.repository.delete_by_user_id(user_id).await
    }

    /// Clean up expired sessions, returning how many were removed
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, Error> {
        self.repository.cleanup_expired().await
    }
}
