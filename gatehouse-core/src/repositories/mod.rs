//! Repository traits for data access layer
//!
//! This module defines the repository interfaces that checks and services use
//! to interact with storage.
//!
//! # Trait Hierarchy
//!
//! - Individual `*Repository` traits define the operations for each data domain
//! - Individual `*RepositoryProvider` traits provide access to each repository type
//! - [`RepositoryProvider`] combines all provider traits plus lifecycle methods
//!
//! Checks and services are generic over a single repository trait. The
//! adapters in [`adapter`] let them share one `Arc<impl RepositoryProvider>`.

pub mod adapter;
pub mod credential;
pub mod ip_range;
pub mod rate_limit;
pub mod session;

pub use adapter::{
    CredentialRepositoryAdapter, IpRangeRepositoryAdapter, RateLimitRepositoryAdapter,
    SessionRepositoryAdapter,
};
pub use credential::CredentialRepository;
pub use ip_range::IpRangeRepository;
pub use rate_limit::RateLimitRepository;
pub use session::SessionRepository;

use async_trait::async_trait;

use crate::Error;

// ============================================================================
// Individual Repository Provider Traits
// ============================================================================

/// Provider trait for credential store access.
pub trait CredentialRepositoryProvider: Send + Sync + 'static {
    /// The credential repository implementation type
    type CredentialRepo: CredentialRepository;

    /// Get the credential repository
    fn credential(&self) -> &Self::CredentialRepo;
}

/// Provider trait for session repository access.
pub trait SessionRepositoryProvider: Send + Sync + 'static {
    /// The session repository implementation type
    type SessionRepo: SessionRepository;

    /// Get the session repository
    fn session(&self) -> &Self::SessionRepo;
}

/// Provider trait for the rate-limit counter store.
pub trait RateLimitRepositoryProvider: Send + Sync + 'static {
    /// The rate-limit repository implementation type
    type RateLimitRepo: RateLimitRepository;

    /// Get the rate-limit repository
    fn rate_limit(&self) -> &Self::RateLimitRepo;
}

/// Provider trait for the IP reputation range table.
pub trait IpRangeRepositoryProvider: Send + Sync + 'static {
    /// The IP range repository implementation type
    type IpRangeRepo: IpRangeRepository;

    /// Get the IP range repository
    fn ip_range(&self) -> &Self::IpRangeRepo;
}

// ============================================================================
// Unified Repository Provider Trait
// ============================================================================

/// Provider trait that storage implementations must implement to provide all repositories.
///
/// # Implementing a Custom Storage Backend
///
/// 1. Implement each individual `*Repository` trait for your backend
/// 2. Implement each individual `*RepositoryProvider` trait
/// 3. Implement the `RepositoryProvider` trait with `migrate()` and `health_check()`
///
/// ```rust,ignore
/// use gatehouse_core::repositories::*;
///
/// struct MyStorage { /* ... */ }
///
/// impl RateLimitRepositoryProvider for MyStorage {
///     type RateLimitRepo = MyRateLimitRepository;
///     fn rate_limit(&self) -> &Self::RateLimitRepo { &self.rate_limit }
/// }
///
/// // ... implement other provider traits ...
///
/// #[async_trait]
/// impl RepositoryProvider for MyStorage {
///     async fn migrate(&self) -> Result<(), Error> { /* ... */ }
///     async fn health_check(&self) -> Result<(), Error> { /* ... */ }
/// }
/// ```
#[async_trait]
pub trait RepositoryProvider:
    CredentialRepositoryProvider
    + SessionRepositoryProvider
    + RateLimitRepositoryProvider
    + IpRangeRepositoryProvider
{
    /// Run migrations for all repositories
    async fn migrate(&self) -> Result<(), Error>;

    /// Health check for all repositories
    async fn health_check(&self) -> Result<(), Error>;
}
