use crate::{
    Error,
    crypto::hash_password,
    error::AuthError,
    repositories::CredentialRepository,
    user::{NewUserRecord, Role, UserId, UserRecord},
    validation::{normalize_login, validate_login, validate_password},
};
use std::sync::Arc;

/// Service for account provisioning and lookup
pub struct UserService<R: CredentialRepository> {
    repository: Arc<R>,
}

impl<R: CredentialRepository> UserService<R> {
    /// Create a new UserService with the given repository
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Create an account with a freshly hashed password.
    ///
    /// The login is normalised before it is stored, so lookups are
    /// case-insensitive.
    pub async fn create_user(
        &self,
        login: &str,
        password: &str,
        role: Role,
    ) -> Result<UserRecord, Error> {
        validate_login(login)?;
        validate_password(password)?;

        let login = normalize_login(login);
        if self.repository.find_by_login(&login).await?.is_some() {
            return Err(AuthError::UserAlreadyExists.into());
        }

        let password_hash = hash_password(password);
        let user = self
            .repository
            .create(NewUserRecord::new(&login, password_hash, role))
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "User created");
        Ok(user)
    }

    /// Get a user by ID
    pub async fn get_user(&self, user_id: &UserId) -> Result<Option<UserRecord>, Error> {
        self.repository.find_by_id(user_id).await
    }

    /// Get a user by login identifier, in any letter case
    pub async fn get_user_by_login(&self, login: &str) -> Result<Option<UserRecord>, Error> {
        self.repository.find_by_login(&normalize_login(login)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{crypto::verify_password, error::ValidationError, services::mock::MockCredentialRepository};

    #[tokio::test]
    async fn test_create_user_hashes_and_normalizes() {
        let repo = Arc::new(MockCredentialRepository::default());
        let service = UserService::new(repo.clone());

        let user = service
            .create_user("  Ops@Example.com ", "correct horse battery", Role::Staff)
            .await
            .unwrap();

        assert_eq!(user.login, "ops@example.com");
        assert_eq!(user.role, Role::Staff);
        assert_ne!(user.password_hash, "correct horse battery");
        assert!(verify_password("correct horse battery", &user.password_hash).unwrap());

        let found = service.get_user_by_login("OPS@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn test_duplicate_login_is_rejected() {
        let service = UserService::new(Arc::new(MockCredentialRepository::default()));
        service
            .create_user("ops@example.com", "correct horse battery", Role::Staff)
            .await
            .unwrap();

        let result = service
            .create_user("OPS@example.com", "another password", Role::Customer)
            .await;
        assert!(matches!(
            result,
            Err(Error::Auth(AuthError::UserAlreadyExists))
        ));
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected() {
        let service = UserService::new(Arc::new(MockCredentialRepository::default()));

        assert!(matches!(
            service.create_user("", "correct horse battery", Role::Staff).await,
            Err(Error::Validation(ValidationError::MissingField(_)))
        ));
        assert!(matches!(
            service.create_user("ops@example.com", "short", Role::Staff).await,
            Err(Error::Validation(ValidationError::InvalidPassword(_)))
        ));
    }
}
