//! Ordered, short-circuiting check runner
//!
//! A [`SecurityManager`] holds checks in registration order and stops at the
//! first failure. Instances carry no phase of their own: the login flow runs
//! one manager before credential verification (without a user) and another
//! after it (with the resolved user).
use std::{fmt, sync::Arc};

use crate::{attempt::LoginAttempt, checks::LoginCheck, user::UserRecord};

#[derive(Clone, Default)]
pub struct SecurityManager {
    checks: Vec<Arc<dyn LoginCheck>>,
}

impl SecurityManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a check. Registration order is execution order.
    pub fn register<C: LoginCheck + 'static>(&mut self, check: C) {
        self.checks.push(Arc::new(check));
    }

    pub fn with_check<C: LoginCheck + 'static>(mut self, check: C) -> Self {
        self.register(check);
        self
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Names of the registered checks, in order.
    pub fn check_names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    /// Run every check in order against the attempt.
    ///
    /// Returns the failure message of the first failing check, or `None` when
    /// all of them pass. Checks after a failing one are never invoked.
    pub async fn run(&self, attempt: &LoginAttempt, user: Option<&UserRecord>) -> Option<String> {
        for check in &self.checks {
            tracing::debug!(check = check.name(), "Running login check");
            let result = check.check(attempt, user).await;
            if !result.passed {
                tracing::warn!(
                    check = check.name(),
                    source = %attempt.source(),
                    with_user = user.is_some(),
                    "Login check failed"
                );
                return Some(
                    result
                        .failure_message
                        .unwrap_or_else(|| check.failure_message().to_string()),
                );
            }
        }

        None
    }
}

impl fmt::Debug for SecurityManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityManager")
            .field("checks", &self.check_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::CheckResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticCheck {
        name: &'static str,
        passes: bool,
        calls: Arc<AtomicUsize>,
    }

    impl StaticCheck {
        fn new(name: &'static str, passes: bool) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let check = Self {
                name,
                passes,
                calls: calls.clone(),
            };
            (check, calls)
        }
    }

    #[async_trait]
    impl LoginCheck for StaticCheck {
        fn name(&self) -> &'static str {
            self.name
        }

        fn failure_message(&self) -> &str {
            self.name
        }

        async fn check(&self, _attempt: &LoginAttempt, _user: Option<&UserRecord>) -> CheckResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.passes {
                CheckResult::pass()
            } else {
                CheckResult::fail(self.failure_message())
            }
        }
    }

    fn attempt() -> LoginAttempt {
        LoginAttempt::from_parts("ops@example.com", "correct horse", "192.0.2.1").unwrap()
    }

    #[tokio::test]
    async fn test_first_failure_short_circuits() {
        let (a, a_calls) = StaticCheck::new("check a failed", false);
        let (b, b_calls) = StaticCheck::new("check b failed", true);
        let manager = SecurityManager::new().with_check(a).with_check(b);

        let failure = manager.run(&attempt(), None).await;

        assert_eq!(failure.as_deref(), Some("check a failed"));
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_passing_returns_none() {
        let (a, a_calls) = StaticCheck::new("a", true);
        let (b, b_calls) = StaticCheck::new("b", true);
        let manager = SecurityManager::new().with_check(a).with_check(b);

        assert_eq!(manager.run(&attempt(), None).await, None);
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_registration_order_is_execution_order() {
        let (a, _) = StaticCheck::new("a", true);
        let (b, _) = StaticCheck::new("b failed", false);
        let (c, c_calls) = StaticCheck::new("c failed", false);

        let mut manager = SecurityManager::new();
        manager.register(a);
        manager.register(b);
        manager.register(c);

        assert_eq!(manager.check_names(), vec!["a", "b failed", "c failed"]);
        assert_eq!(manager.run(&attempt(), None).await.as_deref(), Some("b failed"));
        assert_eq!(c_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_manager_passes() {
        let manager = SecurityManager::new();
        assert!(manager.is_empty());
        assert_eq!(manager.run(&attempt(), None).await, None);
    }
}
