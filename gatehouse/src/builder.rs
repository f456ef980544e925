//! Builder pattern for constructing Gatehouse instances
//!
//! This module provides a type-safe builder for creating [`Gatehouse`] instances
//! with compile-time validation of storage configuration. Check parameters are
//! fixed here; a built instance never changes them.
//!
//! # Example
//!
//! ```rust,no_run
//! use gatehouse::{GatehouseBuilder, RateLimitConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gatehouse = GatehouseBuilder::new()
//!         .with_sqlite("sqlite://gatehouse.db")
//!         .await?
//!         .with_rate_limit(RateLimitConfig::new(10, 600))
//!         .apply_migrations(true)
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use chrono::Duration;
use gatehouse_core::RepositoryProvider;

use crate::{Gatehouse, IpReputationConfig, LoginConfig, RateLimitConfig, RejectionMessages};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur when building a Gatehouse instance.
#[derive(Debug, thiserror::Error)]
pub enum GatehouseBuilderError {
    /// Failed to connect to storage backend
    #[error("Storage connection failed: {0}")]
    StorageConnection(String),

    /// Failed to run database migrations
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

// ============================================================================
// Type-State Markers
// ============================================================================

/// Marker type indicating no storage has been configured yet.
///
/// This is the initial state of [`GatehouseBuilder`].
pub struct NoStorage;

/// Marker type indicating storage has been configured.
pub struct WithStorage<R: RepositoryProvider> {
    repositories: Arc<R>,
}

// ============================================================================
// Builder Implementation
// ============================================================================

/// A type-safe builder for constructing [`Gatehouse`] instances.
///
/// # Type States
///
/// - [`NoStorage`]: Initial state, storage must be configured
/// - [`WithStorage<R>`]: Storage configured, ready to build or add more configuration
pub struct GatehouseBuilder<Storage> {
    storage: Storage,
    rate_limit_config: RateLimitConfig,
    ip_reputation_config: IpReputationConfig,
    login_config: LoginConfig,
    apply_migrations: bool,
}

impl Default for GatehouseBuilder<NoStorage> {
    fn default() -> Self {
        Self::new()
    }
}

impl GatehouseBuilder<NoStorage> {
    /// Create a new builder with default configuration.
    ///
    /// # Defaults
    ///
    /// - Rate limit: 5 attempts per 300 second window, fail-open
    /// - IP reputation: fail-closed
    /// - Check storage timeout: 2 seconds
    /// - Session expiry: 8 hours
    /// - Rejection messages: check-specific
    /// - Apply migrations: false
    pub fn new() -> Self {
        Self {
            storage: NoStorage,
            rate_limit_config: RateLimitConfig::default(),
            ip_reputation_config: IpReputationConfig::default(),
            login_config: LoginConfig::default(),
            apply_migrations: false,
        }
    }

    /// Use an existing repository provider.
    pub fn with_repositories<R: RepositoryProvider>(
        self,
        repositories: Arc<R>,
    ) -> GatehouseBuilder<WithStorage<R>> {
        GatehouseBuilder {
            storage: WithStorage { repositories },
            rate_limit_config: self.rate_limit_config,
            ip_reputation_config: self.ip_reputation_config,
            login_config: self.login_config,
            apply_migrations: self.apply_migrations,
        }
    }
}

// ============================================================================
// Storage Configuration Methods (NoStorage -> WithStorage)
// ============================================================================

#[cfg(feature = "sqlite")]
impl GatehouseBuilder<NoStorage> {
    /// Configure SQLite storage by connecting to the given URL.
    ///
    /// # Arguments
    ///
    /// * `url` - SQLite connection URL (e.g., "sqlite::memory:" or "sqlite://path/to/db.sqlite")
    pub async fn with_sqlite(
        self,
        url: &str,
    ) -> Result<GatehouseBuilder<WithStorage<crate::SqliteRepositoryProvider>>, GatehouseBuilderError>
    {
        let storage = crate::SqliteStorage::connect(url)
            .await
            .map_err(|e| GatehouseBuilderError::StorageConnection(e.to_string()))?;

        Ok(self.with_repositories(Arc::new(storage.into_repository_provider())))
    }

    /// Configure SQLite storage with an existing connection pool.
    ///
    /// Use this when the application already owns a pool and wants to share it.
    pub fn with_sqlite_pool(
        self,
        pool: sqlx::SqlitePool,
    ) -> GatehouseBuilder<WithStorage<crate::SqliteRepositoryProvider>> {
        self.with_repositories(Arc::new(crate::SqliteRepositoryProvider::new(pool)))
    }
}

// ============================================================================
// Configuration Methods (available in any state)
// ============================================================================

impl<S> GatehouseBuilder<S> {
    /// Set the rate limit parameters.
    pub fn with_rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit_config = config;
        self
    }

    /// Set the IP reputation parameters.
    pub fn with_ip_reputation(mut self, config: IpReputationConfig) -> Self {
        self.ip_reputation_config = config;
        self
    }

    pub fn with_login_config(mut self, config: LoginConfig) -> Self {
        self.login_config = config;
        self
    }

    pub fn with_session_expiry(mut self, duration: Duration) -> Self {
        self.login_config.session_expiry = duration;
        self
    }

    pub fn with_rejection_messages(mut self, messages: RejectionMessages) -> Self {
        self.login_config.rejection_messages = messages;
        self
    }

    pub fn apply_migrations(mut self, apply: bool) -> Self {
        self.apply_migrations = apply;
        self
    }
}

// ============================================================================
// Build Methods (WithStorage only)
// ============================================================================

impl<R: RepositoryProvider> GatehouseBuilder<WithStorage<R>> {
    fn validate(&self) -> Result<(), GatehouseBuilderError> {
        if self.rate_limit_config.max_attempts == 0 {
            return Err(GatehouseBuilderError::InvalidConfiguration(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.rate_limit_config.window <= Duration::zero() {
            return Err(GatehouseBuilderError::InvalidConfiguration(
                "rate limit window must be positive".to_string(),
            ));
        }
        if self.login_config.session_expiry <= Duration::zero() {
            return Err(GatehouseBuilderError::InvalidConfiguration(
                "session expiry must be positive".to_string(),
            ));
        }
        if self.login_config.rejection_messages.credential_failure.trim().is_empty() {
            return Err(GatehouseBuilderError::InvalidConfiguration(
                "credential failure message must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the Gatehouse instance.
    ///
    /// If `apply_migrations(true)` was called, migrations are run first.
    pub async fn build(self) -> Result<Gatehouse<R>, GatehouseBuilderError> {
        self.validate()?;

        if self.apply_migrations {
            self.storage
                .repositories
                .migrate()
                .await
                .map_err(|e| GatehouseBuilderError::Migration(e.to_string()))?;
        }

        Ok(Gatehouse::from_parts(
            self.storage.repositories,
            self.rate_limit_config,
            self.ip_reputation_config,
            self.login_config,
        ))
    }
}
