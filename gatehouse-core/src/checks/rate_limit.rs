//! Per-address attempt throttling.
//!
//! Every invocation records one attempt against the canonical source address,
//! including the invocation that goes over the limit. Repeated throttled
//! attempts therefore keep failing until the window rolls over.

use std::{sync::Arc, time::Duration as StdDuration};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use super::{CheckResult, DEFAULT_STORAGE_TIMEOUT, FailurePolicy, LoginCheck, bounded};
use crate::{attempt::LoginAttempt, repositories::RateLimitRepository, user::UserRecord};

pub const RATE_LIMITED_MESSAGE: &str = "Too many login attempts. Please try again later.";

/// Construction-time throttling parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Attempts allowed inside one window. Attempt `max_attempts + 1` fails.
    pub max_attempts: u32,

    /// Length of the counting window
    pub window: Duration,

    /// Resolution of counter store failures. Defaults to fail-open: a store
    /// error cannot be told apart from "never attempted".
    pub failure_policy: FailurePolicy,

    pub storage_timeout: StdDuration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::seconds(300),
            failure_policy: FailurePolicy::FailOpen,
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_attempts: u32, window_seconds: i64) -> Self {
        Self {
            max_attempts,
            window: Duration::seconds(window_seconds),
            ..Default::default()
        }
    }
}

pub struct RateLimitCheck<R: RateLimitRepository> {
    repository: Arc<R>,
    config: RateLimitConfig,
}

impl<R: RateLimitRepository> RateLimitCheck<R> {
    pub fn new(repository: Arc<R>, config: RateLimitConfig) -> Self {
        Self { repository, config }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }
}

#[async_trait]
impl<R: RateLimitRepository> LoginCheck for RateLimitCheck<R> {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn failure_message(&self) -> &str {
        RATE_LIMITED_MESSAGE
    }

    async fn check(&self, attempt: &LoginAttempt, _user: Option<&UserRecord>) -> CheckResult {
        let key = attempt.source().key();
        let recorded = bounded(
            self.config.storage_timeout,
            self.repository
                .record_attempt(&key, Utc::now(), self.config.window),
        )
        .await;

        let record = match recorded {
            Ok(record) => record,
            Err(e) if self.config.failure_policy.passes_on_error() => {
                tracing::error!(error = %e, key = %key, "Failed to record login attempt, allowing attempt");
                return CheckResult::pass();
            }
            Err(e) => {
                tracing::error!(error = %e, key = %key, "Failed to record login attempt, rejecting attempt");
                return CheckResult::fail(self.failure_message());
            }
        };

        if record.exceeds(self.config.max_attempts) {
            tracing::warn!(
                key = %key,
                attempt_count = record.attempt_count,
                max_attempts = self.config.max_attempts,
                "Rate limit exceeded"
            );
            return CheckResult::fail(self.failure_message());
        }

        tracing::debug!(key = %key, attempt_count = record.attempt_count, "Login attempt recorded");
        CheckResult::pass()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, error::StorageError, storage::RateLimitRecord};
    use chrono::DateTime;
    use std::{collections::HashMap, sync::Mutex};

    #[derive(Default)]
    struct MockRateLimitRepository {
        records: Mutex<HashMap<String, RateLimitRecord>>,
        fail: bool,
    }

    impl MockRateLimitRepository {
        fn seed(&self, record: RateLimitRecord) {
            self.records
                .lock()
                .unwrap()
                .insert(record.key.clone(), record);
        }

        fn get(&self, key: &str) -> Option<RateLimitRecord> {
            self.records.lock().unwrap().get(key).cloned()
        }
    }

    #[async_trait]
    impl RateLimitRepository for MockRateLimitRepository {
        async fn record_attempt(
            &self,
            key: &str,
            now: DateTime<Utc>,
            window: Duration,
        ) -> Result<RateLimitRecord, Error> {
            if self.fail {
                return Err(StorageError::Database("counter store unavailable".into()).into());
            }
            let mut records = self.records.lock().unwrap();
            let record = match records.remove(key) {
                Some(existing) => existing.advance(now, window),
                None => RateLimitRecord::first(key, now),
            };
            records.insert(key.to_string(), record.clone());
            Ok(record)
        }

        async fn find(&self, key: &str) -> Result<Option<RateLimitRecord>, Error> {
            Ok(self.get(key))
        }

        async fn reset(&self, key: &str) -> Result<bool, Error> {
            Ok(self.records.lock().unwrap().remove(key).is_some())
        }
    }

    fn attempt(source: &str) -> LoginAttempt {
        LoginAttempt::from_parts("ops@example.com", "correct horse", source).unwrap()
    }

    #[tokio::test]
    async fn test_first_attempt_passes_and_counts_one() {
        let repo = Arc::new(MockRateLimitRepository::default());
        let check = RateLimitCheck::new(repo.clone(), RateLimitConfig::default());

        assert!(check.check(&attempt("192.0.2.1"), None).await.passed);

        let record = repo.get("192.0.2.1").unwrap();
        assert_eq!(record.attempt_count, 1);
        assert_eq!(record.window_start, record.last_attempt);
    }

    #[tokio::test]
    async fn test_sixth_attempt_in_window_fails() {
        let repo = Arc::new(MockRateLimitRepository::default());
        let check = RateLimitCheck::new(repo.clone(), RateLimitConfig::new(5, 300));
        let attempt = attempt("192.0.2.1");

        for call in 1..=5 {
            assert!(
                check.check(&attempt, None).await.passed,
                "call {call} should pass"
            );
        }

        let sixth = check.check(&attempt, None).await;
        assert!(!sixth.passed);
        assert_eq!(sixth.failure_message.as_deref(), Some(RATE_LIMITED_MESSAGE));
        assert_eq!(repo.get("192.0.2.1").unwrap().attempt_count, 6);

        // Throttled attempts are still recorded
        assert!(!check.check(&attempt, None).await.passed);
        assert_eq!(repo.get("192.0.2.1").unwrap().attempt_count, 7);
    }

    #[tokio::test]
    async fn test_expired_window_resets() {
        let repo = Arc::new(MockRateLimitRepository::default());
        let opened = Utc::now() - Duration::seconds(301);
        repo.seed(RateLimitRecord {
            key: "192.0.2.1".to_string(),
            attempt_count: 40,
            window_start: opened,
            last_attempt: opened + Duration::seconds(10),
        });
        let check = RateLimitCheck::new(repo.clone(), RateLimitConfig::new(5, 300));

        assert!(check.check(&attempt("192.0.2.1"), None).await.passed);

        let record = repo.get("192.0.2.1").unwrap();
        assert_eq!(record.attempt_count, 1);
        assert!(record.window_start > opened);
    }

    #[tokio::test]
    async fn test_keys_are_canonical_and_independent() {
        let repo = Arc::new(MockRateLimitRepository::default());
        let check = RateLimitCheck::new(repo.clone(), RateLimitConfig::new(1, 300));

        assert!(check.check(&attempt("::1"), None).await.passed);
        assert!(!check.check(&attempt("127.0.0.1"), None).await.passed);
        assert!(check.check(&attempt("192.0.2.9"), None).await.passed);
        assert_eq!(repo.get("127.0.0.1").unwrap().attempt_count, 2);
    }

    #[tokio::test]
    async fn test_store_error_allows_attempt() {
        let repo = Arc::new(MockRateLimitRepository {
            fail: true,
            ..Default::default()
        });
        let check = RateLimitCheck::new(repo, RateLimitConfig::default());
        assert!(check.check(&attempt("192.0.2.1"), None).await.passed);
    }

    #[tokio::test]
    async fn test_store_error_with_fail_closed_policy() {
        let repo = Arc::new(MockRateLimitRepository {
            fail: true,
            ..Default::default()
        });
        let check = RateLimitCheck::new(
            repo,
            RateLimitConfig {
                failure_policy: FailurePolicy::FailClosed,
                ..Default::default()
            },
        );
        assert!(!check.check(&attempt("192.0.2.1"), None).await.passed);
    }
}
