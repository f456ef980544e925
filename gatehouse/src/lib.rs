//! # Gatehouse
//!
//! Gatehouse decides whether a login attempt may proceed. Each attempt passes
//! through a chain of pluggable checks before and after credential
//! verification:
//!
//! - IP reputation: attempts from an active blocked range are rejected, and an
//!   unreachable range table blocks rather than allows
//! - Rate limiting: attempts per source address are counted in a resetting
//!   window; an unreachable counter store allows rather than blocks
//! - Credential verification with a generic rejection that never reveals
//!   whether the identifier or the password was wrong
//! - Role dispatch to a landing destination, and an opaque session token
//!
//! ## Storage Support
//!
//! - SQLite (`sqlite` feature, enabled by default)
//!
//! ## Example
//!
//! ```rust,no_run
//! use gatehouse::{GatehouseBuilder, LoginOutcome, Role};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gatehouse = GatehouseBuilder::new()
//!         .with_sqlite("sqlite::memory:")
//!         .await?
//!         .apply_migrations(true)
//!         .build()
//!         .await?;
//!
//!     gatehouse
//!         .create_user("ops@example.com", "correct horse battery", Role::Staff)
//!         .await?;
//!
//!     match gatehouse
//!         .login("ops@example.com", "correct horse battery", "127.0.0.1".parse()?)
//!         .await
//!     {
//!         LoginOutcome::Proceed(success) => println!("go to {}", success.landing.path()),
//!         LoginOutcome::Reject(rejection) => println!("{}", rejection.message),
//!     }
//!
//!     Ok(())
//! }
//! ```
use std::{net::IpAddr, sync::Arc};

use gatehouse_core::{
    IpReputationCheck, RateLimitCheck, SecurityManager,
    repositories::{
        CredentialRepositoryAdapter, IpRangeRepository, IpRangeRepositoryAdapter,
        RateLimitRepository, RateLimitRepositoryAdapter, SessionRepositoryAdapter,
    },
    services::{LoginService, SessionService, UserService},
};

pub mod builder;

pub use builder::{GatehouseBuilder, GatehouseBuilderError, NoStorage, WithStorage};

/// Re-export core types from gatehouse_core
///
/// These types are commonly used when working with the Gatehouse API.
pub use gatehouse_core::{
    AuthenticatedSession, CheckResult, FailurePolicy, IpRangeEntry, IpReputationConfig, Landing,
    LoginAttempt, LoginCheck, LoginConfig, LoginOutcome, LoginSuccess, NewIpRange, RateLimitConfig,
    RateLimitRecord, RejectionMessages, RepositoryProvider, Role, SessionToken, SourceAddress,
    UserId, UserRecord, services::LoginRejection,
};

/// Re-export storage backends
///
/// These storage implementations are available when the corresponding feature is enabled.
#[cfg(feature = "sqlite")]
pub use gatehouse_storage_sqlite::{SqliteRepositoryProvider, SqliteStorage};

/// Errors that can occur when using Gatehouse.
///
/// Login itself never fails with an error; it resolves to a [`LoginOutcome`].
/// These errors come from administration and session operations.
#[derive(Debug, thiserror::Error)]
pub enum GatehouseError {
    /// Error during authentication or account management
    #[error("Auth error: {0}")]
    AuthError(String),
    /// Error when interacting with storage
    #[error("Storage error: {0}")]
    StorageError(String),
    /// Invalid input
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<gatehouse_core::Error> for GatehouseError {
    fn from(error: gatehouse_core::Error) -> Self {
        use gatehouse_core::Error;

        match error {
            Error::Auth(e) => GatehouseError::AuthError(e.to_string()),
            Error::Storage(e) => GatehouseError::StorageError(e.to_string()),
            Error::Validation(e) => GatehouseError::ValidationError(e.to_string()),
        }
    }
}

impl From<gatehouse_core::error::ValidationError> for GatehouseError {
    fn from(error: gatehouse_core::error::ValidationError) -> Self {
        GatehouseError::ValidationError(error.to_string())
    }
}

type Credentials<R> = CredentialRepositoryAdapter<R>;
type Sessions<R> = SessionRepositoryAdapter<R>;

/// The main entry point: a login pipeline wired to one storage backend.
///
/// The pre-credential phase runs the IP reputation check and then the rate
/// limit check. The post-credential phase is empty unless checks are added
/// with [`with_post_check`](Self::with_post_check).
pub struct Gatehouse<R: RepositoryProvider> {
    repositories: Arc<R>,
    user_service: Arc<UserService<Credentials<R>>>,
    session_service: Arc<SessionService<Sessions<R>>>,
    login_service: LoginService<Credentials<R>, Sessions<R>>,
    ip_ranges: Arc<IpRangeRepositoryAdapter<R>>,
    rate_limits: Arc<RateLimitRepositoryAdapter<R>>,
    rate_limit_config: RateLimitConfig,
    ip_reputation_config: IpReputationConfig,
}

impl<R: RepositoryProvider> Gatehouse<R> {
    /// Create a Gatehouse with default check and login configuration.
    pub fn new(repositories: Arc<R>) -> Self {
        Self::from_parts(
            repositories,
            RateLimitConfig::default(),
            IpReputationConfig::default(),
            LoginConfig::default(),
        )
    }

    pub(crate) fn from_parts(
        repositories: Arc<R>,
        rate_limit_config: RateLimitConfig,
        ip_reputation_config: IpReputationConfig,
        login_config: LoginConfig,
    ) -> Self {
        let credential_repo = Arc::new(CredentialRepositoryAdapter::new(repositories.clone()));
        let session_repo = Arc::new(SessionRepositoryAdapter::new(repositories.clone()));
        let ip_ranges = Arc::new(IpRangeRepositoryAdapter::new(repositories.clone()));
        let rate_limits = Arc::new(RateLimitRepositoryAdapter::new(repositories.clone()));

        let user_service = Arc::new(UserService::new(credential_repo.clone()));
        let session_service = Arc::new(SessionService::new(session_repo));

        let pre_checks = SecurityManager::new()
            .with_check(IpReputationCheck::new(
                ip_ranges.clone(),
                ip_reputation_config.clone(),
            ))
            .with_check(RateLimitCheck::new(
                rate_limits.clone(),
                rate_limit_config.clone(),
            ));

        let login_service = LoginService::new(
            credential_repo,
            session_service.clone(),
            pre_checks,
            login_config,
        );

        Self {
            repositories,
            user_service,
            session_service,
            login_service,
            ip_ranges,
            rate_limits,
            rate_limit_config,
            ip_reputation_config,
        }
    }

    /// Add a check to the post-credential phase.
    ///
    /// Post-phase checks receive the verified user. Do not add a rate limit
    /// check here; the pre-phase already counts every attempt once.
    pub fn with_post_check<C: LoginCheck + 'static>(mut self, check: C) -> Self {
        let post_checks = self.login_service.post_checks().clone().with_check(check);
        self.login_service = self.login_service.with_post_checks(post_checks);
        self
    }

    pub fn rate_limit_config(&self) -> &RateLimitConfig {
        &self.rate_limit_config
    }

    pub fn ip_reputation_config(&self) -> &IpReputationConfig {
        &self.ip_reputation_config
    }

    pub fn login_config(&self) -> &LoginConfig {
        self.login_service.config()
    }

    /// Run migrations for all repositories
    pub async fn migrate(&self) -> Result<(), GatehouseError> {
        self.repositories
            .migrate()
            .await
            .map_err(|e| GatehouseError::StorageError(e.to_string()))
    }

    /// Health check for all repositories
    pub async fn health_check(&self) -> Result<(), GatehouseError> {
        self.repositories
            .health_check()
            .await
            .map_err(|e| GatehouseError::StorageError(e.to_string()))
    }

    // ------------------------------------------------------------------
    // Login flow
    // ------------------------------------------------------------------

    /// Decide a login attempt.
    ///
    /// # Arguments
    ///
    /// * `identifier` - Login identifier as submitted (email or username)
    /// * `secret` - Password as submitted
    /// * `source` - Client address from the transport layer
    ///
    /// # Returns
    ///
    /// [`LoginOutcome::Proceed`] with the new session and landing destination,
    /// or [`LoginOutcome::Reject`] with a single opaque message.
    pub async fn login(&self, identifier: &str, secret: &str, source: IpAddr) -> LoginOutcome {
        let attempt = LoginAttempt::new(identifier, secret, SourceAddress::new(source));
        self.login_service.login(&attempt).await
    }

    /// Decide an already constructed login attempt.
    pub async fn login_attempt(&self, attempt: &LoginAttempt) -> LoginOutcome {
        self.login_service.login(attempt).await
    }

    /// Get a live session by its token. Expired sessions read as `None`.
    pub async fn get_session(
        &self,
        token: &SessionToken,
    ) -> Result<Option<AuthenticatedSession>, GatehouseError> {
        Ok(self.session_service.get_session(token).await?)
    }

    /// End a session.
    pub async fn logout(&self, token: &SessionToken) -> Result<(), GatehouseError> {
        self.session_service.delete_session(token).await?;
        tracing::info!("Session ended");
        Ok(())
    }

    /// End every session belonging to a user.
    pub async fn logout_everywhere(&self, user_id: &UserId) -> Result<(), GatehouseError> {
        Ok(self.session_service.delete_user_sessions(user_id).await?)
    }

    /// Remove expired sessions, returning how many were deleted.
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, GatehouseError> {
        Ok(self.session_service.cleanup_expired_sessions().await?)
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    /// Create an account with a hashed password.
    pub async fn create_user(
        &self,
        login: &str,
        password: &str,
        role: Role,
    ) -> Result<UserRecord, GatehouseError> {
        Ok(self.user_service.create_user(login, password, role).await?)
    }

    pub async fn get_user(&self, user_id: &UserId) -> Result<Option<UserRecord>, GatehouseError> {
        Ok(self.user_service.get_user(user_id).await?)
    }

    // ------------------------------------------------------------------
    // IP reputation administration
    // ------------------------------------------------------------------

    /// Block every address in the inclusive range `start..=end`.
    pub async fn block_range(
        &self,
        start: IpAddr,
        end: IpAddr,
    ) -> Result<IpRangeEntry, GatehouseError> {
        let range = NewIpRange::new(start, end)?;
        let entry = self.ip_ranges.create(range).await?;
        tracing::info!(
            range_id = entry.id,
            start = %entry.range_start,
            end = %entry.range_end,
            "IP range blocked"
        );
        Ok(entry)
    }

    /// Block a single address.
    pub async fn block_address(&self, address: IpAddr) -> Result<IpRangeEntry, GatehouseError> {
        let entry = self.ip_ranges.create(NewIpRange::single(address)).await?;
        tracing::info!(range_id = entry.id, address = %entry.range_start, "IP address blocked");
        Ok(entry)
    }

    /// Activate or deactivate a range. Returns `false` if the range does not exist.
    pub async fn set_range_active(&self, id: i64, active: bool) -> Result<bool, GatehouseError> {
        let updated = self.ip_ranges.set_active(id, active).await?;
        if updated {
            tracing::info!(range_id = id, active, "IP range updated");
        }
        Ok(updated)
    }

    pub async fn list_ranges(&self) -> Result<Vec<IpRangeEntry>, GatehouseError> {
        Ok(self.ip_ranges.list().await?)
    }

    // ------------------------------------------------------------------
    // Rate limit administration
    // ------------------------------------------------------------------

    /// Current counter for an address, if it has made any attempts.
    pub async fn rate_limit_status(
        &self,
        address: IpAddr,
    ) -> Result<Option<RateLimitRecord>, GatehouseError> {
        let key = SourceAddress::new(address).key();
        Ok(self.rate_limits.find(&key).await?)
    }

    /// Clear the counter for an address. Returns whether one existed.
    pub async fn reset_rate_limit(&self, address: IpAddr) -> Result<bool, GatehouseError> {
        let key = SourceAddress::new(address).key();
        let existed = self.rate_limits.reset(&key).await?;
        tracing::info!(key = %key, existed, "Rate limit counter reset");
        Ok(existed)
    }
}
