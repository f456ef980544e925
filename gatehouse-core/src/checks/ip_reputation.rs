//! Address reputation check backed by the blocked range table.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

use super::{CheckResult, DEFAULT_STORAGE_TIMEOUT, FailurePolicy, LoginCheck, bounded};
use crate::{attempt::LoginAttempt, repositories::IpRangeRepository, user::UserRecord};

pub const IP_BLOCKED_MESSAGE: &str = "Access denied from your IP address.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpReputationConfig {
    /// Resolution of range lookup failures. Defaults to fail-closed so an
    /// unreachable table never lets a blocked address in.
    pub failure_policy: FailurePolicy,
    pub storage_timeout: Duration,
}

impl Default for IpReputationConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::FailClosed,
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
        }
    }
}

/// Blocks attempts whose source address falls inside an active range.
pub struct IpReputationCheck<R: IpRangeRepository> {
    repository: Arc<R>,
    config: IpReputationConfig,
}

impl<R: IpRangeRepository> IpReputationCheck<R> {
    pub fn new(repository: Arc<R>, config: IpReputationConfig) -> Self {
        Self { repository, config }
    }

    pub fn config(&self) -> &IpReputationConfig {
        &self.config
    }
}

#[async_trait]
impl<R: IpRangeRepository> LoginCheck for IpReputationCheck<R> {
    fn name(&self) -> &'static str {
        "ip_reputation"
    }

    fn failure_message(&self) -> &str {
        IP_BLOCKED_MESSAGE
    }

    async fn check(&self, attempt: &LoginAttempt, _user: Option<&UserRecord>) -> CheckResult {
        let address = attempt.source();
        let lookup = bounded(
            self.config.storage_timeout,
            self.repository.find_active_match(address),
        )
        .await;

        match lookup {
            Ok(None) => CheckResult::pass(),
            Ok(Some(range)) => {
                tracing::warn!(
                    address = %address,
                    range_id = range.id,
                    "Source address matched a blocked range"
                );
                CheckResult::fail(self.failure_message())
            }
            Err(e) if self.config.failure_policy.passes_on_error() => {
                tracing::error!(error = %e, address = %address, "IP range lookup failed, allowing attempt");
                CheckResult::pass()
            }
            Err(e) => {
                tracing::error!(error = %e, address = %address, "IP range lookup failed, blocking attempt");
                CheckResult::fail(self.failure_message())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Error,
        address::SourceAddress,
        error::StorageError,
        storage::{IpRangeEntry, NewIpRange},
    };
    use chrono::Utc;
    use std::sync::Mutex;

    struct MockIpRangeRepository {
        ranges: Mutex<Vec<IpRangeEntry>>,
        fail: bool,
        delay: Option<Duration>,
    }

    impl MockIpRangeRepository {
        fn new() -> Self {
            Self {
                ranges: Mutex::new(Vec::new()),
                fail: false,
                delay: None,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }

        fn block(&self, start: &str, end: &str, active: bool) {
            let range = NewIpRange::new(start.parse().unwrap(), end.parse().unwrap()).unwrap();
            let mut ranges = self.ranges.lock().unwrap();
            let id = ranges.len() as i64 + 1;
            ranges.push(IpRangeEntry {
                id,
                version: range.version,
                range_start: range.range_start,
                range_end: range.range_end,
                active,
                created_at: Utc::now(),
            });
        }
    }

    #[async_trait]
    impl IpRangeRepository for MockIpRangeRepository {
        async fn find_active_match(
            &self,
            address: &SourceAddress,
        ) -> Result<Option<IpRangeEntry>, Error> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(StorageError::Connection("range table unavailable".into()).into());
            }
            let ranges = self.ranges.lock().unwrap();
            Ok(ranges.iter().find(|r| r.contains(address)).cloned())
        }

        async fn create(&self, _range: NewIpRange) -> Result<IpRangeEntry, Error> {
            unimplemented!()
        }

        async fn set_active(&self, _id: i64, _active: bool) -> Result<bool, Error> {
            unimplemented!()
        }

        async fn list(&self) -> Result<Vec<IpRangeEntry>, Error> {
            Ok(self.ranges.lock().unwrap().clone())
        }
    }

    fn attempt(source: &str) -> LoginAttempt {
        LoginAttempt::from_parts("ops@example.com", "correct horse", source).unwrap()
    }

    fn check_with(repo: MockIpRangeRepository) -> IpReputationCheck<MockIpRangeRepository> {
        IpReputationCheck::new(Arc::new(repo), IpReputationConfig::default())
    }

    #[tokio::test]
    async fn test_address_inside_active_range_is_blocked() {
        let repo = MockIpRangeRepository::new();
        repo.block("203.0.113.0", "203.0.113.255", true);
        let check = check_with(repo);

        for source in ["203.0.113.0", "203.0.113.77", "203.0.113.255"] {
            let result = check.check(&attempt(source), None).await;
            assert!(!result.passed, "{source} should be blocked");
            assert_eq!(result.failure_message.as_deref(), Some(IP_BLOCKED_MESSAGE));
        }
    }

    #[tokio::test]
    async fn test_address_outside_ranges_is_allowed() {
        let repo = MockIpRangeRepository::new();
        repo.block("203.0.113.0", "203.0.113.255", true);
        repo.block("198.51.100.0", "198.51.100.255", false);
        let check = check_with(repo);

        for source in ["203.0.114.0", "198.51.100.10", "2001:db8::1"] {
            assert!(check.check(&attempt(source), None).await.passed);
        }
    }

    #[tokio::test]
    async fn test_loopback_forms_share_identity() {
        let repo = MockIpRangeRepository::new();
        repo.block("127.0.0.1", "127.0.0.1", true);
        let check = check_with(repo);

        assert!(!check.check(&attempt("::1"), None).await.passed);
        assert!(!check.check(&attempt("::ffff:127.0.0.1"), None).await.passed);
    }

    #[tokio::test]
    async fn test_store_error_blocks() {
        let check = check_with(MockIpRangeRepository::failing());
        let result = check.check(&attempt("192.0.2.10"), None).await;
        assert!(!result.passed);
        assert_eq!(result.failure_message.as_deref(), Some(IP_BLOCKED_MESSAGE));
    }

    #[tokio::test]
    async fn test_store_error_with_fail_open_policy() {
        let check = IpReputationCheck::new(
            Arc::new(MockIpRangeRepository::failing()),
            IpReputationConfig {
                failure_policy: FailurePolicy::FailOpen,
                ..Default::default()
            },
        );
        assert!(check.check(&attempt("192.0.2.10"), None).await.passed);
    }

    #[tokio::test]
    async fn test_slow_store_is_treated_as_error() {
        let repo = MockIpRangeRepository {
            delay: Some(Duration::from_secs(5)),
            ..MockIpRangeRepository::new()
        };
        let check = IpReputationCheck::new(
            Arc::new(repo),
            IpReputationConfig {
                storage_timeout: Duration::from_millis(20),
                ..Default::default()
            },
        );

        assert!(!check.check(&attempt("192.0.2.10"), None).await.passed);
    }
}
