use crate::{
    Error,
    session::{AuthenticatedSession, SessionToken},
    user::UserId,
};
use async_trait::async_trait;

/// Repository for session data access
#[async_trait]
pub trait SessionRepository: Send + Sync + 'static {
    /// Persist a newly established session
    async fn create(&self, session: AuthenticatedSession) -> Result<AuthenticatedSession, Error>;

    /// Find a session by token
    async fn find_by_token(
        &self,
        token: &SessionToken,
    ) -> Result<Option<AuthenticatedSession>, Error>;

    /// Delete a session by token
    async fn delete(&self, token: &SessionToken) -> Result<(), Error>;

    /// Delete all sessions for a user
    async fn delete_by_user_id(&self, user_id: &UserId) -> Result<(), Error>;

    /// Remove sessions past their expiry, returning how many were removed
    async fn cleanup_expired(&self) -> Result<u64, Error>;
}
