use crate::{
    Error,
    user::{NewUserRecord, UserId, UserRecord},
};
use async_trait::async_trait;

/// Repository for credential data access
///
/// Login identifiers are stored normalised; implementations compare the
/// already-normalised argument for equality.
#[async_trait]
pub trait CredentialRepository: Send + Sync + 'static {
    /// Create a new user record
    async fn create(&self, user: NewUserRecord) -> Result<UserRecord, Error>;

    /// Find a user by normalised login identifier
    async fn find_by_login(&self, login: &str) -> Result<Option<UserRecord>, Error>;

    /// Find a user by ID
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, Error>;
}
