//! SQLite storage backend for gatehouse
//!
//! Implements every repository trait from `gatehouse-core` on top of one
//! [`SqlitePool`]. Rate-limit counters are updated with a single atomic
//! upsert, so concurrent attempts for one address never lose increments.
//!
//! ```rust,no_run
//! use gatehouse_core::RepositoryProvider;
//! use gatehouse_storage_sqlite::SqliteStorage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = SqliteStorage::connect("sqlite://gatehouse.db").await?;
//! let repositories = storage.into_repository_provider();
//! repositories.migrate().await?;
//! # Ok(())
//! # }
//! ```

pub mod migrations;
pub mod repositories;

use std::str::FromStr;

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub use repositories::{
    SqliteIpRangeRepository, SqliteRateLimitRepository, SqliteRepositoryProvider,
    SqliteSessionRepository, SqliteUserRepository,
};

/// A connected SQLite database.
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to `url`, creating the database file if it does not exist.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn into_repository_provider(self) -> SqliteRepositoryProvider {
        SqliteRepositoryProvider::new(self.pool)
    }
}
