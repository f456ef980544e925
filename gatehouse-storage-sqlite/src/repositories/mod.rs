//! Repository implementations for SQLite storage

pub mod ip_range;
pub mod rate_limit;
pub mod session;
pub mod user;

pub use ip_range::SqliteIpRangeRepository;
pub use rate_limit::SqliteRateLimitRepository;
pub use session::SqliteSessionRepository;
pub use user::SqliteUserRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatehouse_core::{
    Error,
    error::StorageError,
    repositories::{
        CredentialRepositoryProvider, IpRangeRepositoryProvider, RateLimitRepositoryProvider,
        RepositoryProvider, SessionRepositoryProvider,
    },
};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::migrations::{SqliteMigrationManager, all_migrations};

/// Unix seconds as stored in every table.
pub(crate) fn from_timestamp(secs: i64) -> Result<DateTime<Utc>, Error> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| Error::Storage(StorageError::Database(format!("Invalid timestamp {secs}"))))
}

/// Repository provider implementation for SQLite
///
/// This struct implements all the individual repository provider traits
/// as well as the unified `RepositoryProvider` trait.
pub struct SqliteRepositoryProvider {
    pool: SqlitePool,
    user: Arc<SqliteUserRepository>,
    session: Arc<SqliteSessionRepository>,
    rate_limit: Arc<SqliteRateLimitRepository>,
    ip_range: Arc<SqliteIpRangeRepository>,
}

impl SqliteRepositoryProvider {
    pub fn new(pool: SqlitePool) -> Self {
        let user = Arc::new(SqliteUserRepository::new(pool.clone()));
        let session = Arc::new(SqliteSessionRepository::new(pool.clone()));
        let rate_limit = Arc::new(SqliteRateLimitRepository::new(pool.clone()));
        let ip_range = Arc::new(SqliteIpRangeRepository::new(pool.clone()));

        Self {
            pool,
            user,
            session,
            rate_limit,
            ip_range,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl CredentialRepositoryProvider for SqliteRepositoryProvider {
    type CredentialRepo = SqliteUserRepository;

    fn credential(&self) -> &Self::CredentialRepo {
        &self.user
    }
}

impl SessionRepositoryProvider for SqliteRepositoryProvider {
    type SessionRepo = SqliteSessionRepository;

    fn session(&self) -> &Self::SessionRepo {
        &self.session
    }
}

impl RateLimitRepositoryProvider for SqliteRepositoryProvider {
    type RateLimitRepo = SqliteRateLimitRepository;

    fn rate_limit(&self) -> &Self::RateLimitRepo {
        &self.rate_limit
    }
}

impl IpRangeRepositoryProvider for SqliteRepositoryProvider {
    type IpRangeRepo = SqliteIpRangeRepository;

    fn ip_range(&self) -> &Self::IpRangeRepo {
        &self.ip_range
    }
}

#[async_trait]
impl RepositoryProvider for SqliteRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        let manager = SqliteMigrationManager::new(self.pool.clone());
        manager.initialize().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to initialize migrations");
            Error::Storage(StorageError::Migration(
                "Failed to initialize migrations".to_string(),
            ))
        })?;

        manager.up(&all_migrations()).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            Error::Storage(StorageError::Migration(
                "Failed to run migrations".to_string(),
            ))
        })?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;
        Ok(())
    }
}
