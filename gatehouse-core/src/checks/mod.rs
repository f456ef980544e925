//! Login checks
//!
//! A check is a single pass/fail predicate over a [`LoginAttempt`], optionally
//! given the user resolved by credential verification. "Fails" is an ordinary
//! return value; a check never surfaces an error to its caller.
//!
//! Checks that depend on storage resolve persistence faults through a
//! [`FailurePolicy`], so whether a broken store lets attempts through is an
//! explicit, per-check setting.
//!
//! # Example
//!
//! ```rust,ignore
//! use gatehouse_core::checks::{CheckResult, LoginCheck};
//!
//! struct BusinessHours;
//!
//! #[async_trait]
//! impl LoginCheck for BusinessHours {
//!     fn name(&self) -> &'static str { "business_hours" }
//!
//!     fn failure_message(&self) -> &str { "Logins are closed right now." }
//!
//!     async fn check(&self, _: &LoginAttempt, _: Option<&UserRecord>) -> CheckResult {
//!         CheckResult::pass()
//!     }
//! }
//! ```

pub mod ip_reputation;
pub mod rate_limit;

pub use ip_reputation::{IpReputationCheck, IpReputationConfig};
pub use rate_limit::{RateLimitCheck, RateLimitConfig};

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Error, attempt::LoginAttempt, error::StorageError, user::UserRecord};

/// Default bound on a single persistence call made by a check.
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(2);

/// Outcome of one check invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub passed: bool,
    pub failure_message: Option<String>,
}

impl CheckResult {
    pub fn pass() -> Self {
        Self {
            passed: true,
            failure_message: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            failure_message: Some(message.into()),
        }
    }
}

/// How a check resolves when its own storage dependency is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Treat the fault as a pass
    FailOpen,
    /// Treat the fault as a failure
    FailClosed,
}

impl FailurePolicy {
    pub fn passes_on_error(&self) -> bool {
        matches!(self, FailurePolicy::FailOpen)
    }
}

/// A pluggable login check.
///
/// Implementations must accept `user = None` (the pre-credential phase) and
/// ignore any attempt fields they do not need.
#[async_trait]
pub trait LoginCheck: Send + Sync {
    /// Short stable name used in logs
    fn name(&self) -> &'static str;

    /// Fixed explanation returned when [`check`](Self::check) fails
    fn failure_message(&self) -> &str;

    async fn check(&self, attempt: &LoginAttempt, user: Option<&UserRecord>) -> CheckResult;
}

/// Run a persistence call with an upper bound on its duration.
///
/// Expiry is reported as [`StorageError::Timeout`] so it flows through the
/// same failure policy as any other storage fault.
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::Timeout(limit).into()),
    }
}
