//! End-to-end login flow against SQLite storage

#![cfg(feature = "sqlite")]

use std::net::IpAddr;

use async_trait::async_trait;
use gatehouse::{
    CheckResult, Gatehouse, GatehouseBuilder, Landing, LoginAttempt, LoginCheck, Role,
    SessionToken, SqliteRepositoryProvider, UserRecord,
};

const SECRET: &str = "correct horse battery";
const CREDENTIAL_FAILURE: &str = "Invalid username or password.";
const IP_BLOCKED: &str = "Access denied from your IP address.";
const RATE_LIMITED: &str = "Too many login attempts. Please try again later.";

async fn setup() -> Gatehouse<SqliteRepositoryProvider> {
    let gatehouse = GatehouseBuilder::new()
        .with_sqlite("sqlite::memory:")
        .await
        .expect("Failed to connect to SQLite")
        .apply_migrations(true)
        .build()
        .await
        .expect("Failed to build Gatehouse");

    gatehouse
        .create_user("ops@example.com", SECRET, Role::Staff)
        .await
        .expect("Failed to create staff user");
    gatehouse
        .create_user("shopper@example.com", SECRET, Role::Customer)
        .await
        .expect("Failed to create customer user");

    gatehouse
}

fn ip(text: &str) -> IpAddr {
    text.parse().unwrap()
}

#[tokio::test]
async fn test_staff_login_lands_on_dashboard() {
    let gatehouse = setup().await;

    let outcome = gatehouse
        .login("ops@example.com", SECRET, ip("192.0.2.10"))
        .await;

    let success = outcome.success().expect("login should proceed");
    assert_eq!(success.role(), &Role::Staff);
    assert_eq!(success.landing, Landing::StaffDashboard);

    let session = gatehouse
        .get_session(&success.session.token)
        .await
        .unwrap()
        .expect("session should exist");
    assert_eq!(&session.user_id, success.user_id());
    assert_eq!(session.role, Role::Staff);
}

#[tokio::test]
async fn test_customer_login_lands_on_account() {
    let gatehouse = setup().await;

    let outcome = gatehouse
        .login("Shopper@Example.COM", SECRET, ip("192.0.2.10"))
        .await;

    assert_eq!(
        outcome.success().map(|s| s.landing.path()),
        Some("/account")
    );
}

#[tokio::test]
async fn test_wrong_secret_and_unknown_identifier_are_indistinguishable() {
    let gatehouse = setup().await;

    let wrong_secret = gatehouse
        .login("ops@example.com", "wrong password", ip("192.0.2.10"))
        .await;
    let unknown = gatehouse
        .login("ghost@example.com", SECRET, ip("192.0.2.11"))
        .await;

    assert_eq!(wrong_secret.rejection_message(), Some(CREDENTIAL_FAILURE));
    assert_eq!(unknown.rejection_message(), Some(CREDENTIAL_FAILURE));
}

#[tokio::test]
async fn test_blocked_range_rejects_before_credentials() {
    let gatehouse = setup().await;
    gatehouse
        .block_range(ip("203.0.113.0"), ip("203.0.113.255"))
        .await
        .unwrap();

    // Correct credentials do not help from a blocked address
    let outcome = gatehouse
        .login("ops@example.com", SECRET, ip("203.0.113.9"))
        .await;
    assert_eq!(outcome.rejection_message(), Some(IP_BLOCKED));

    // A blocked attempt never reaches the rate limit check
    assert!(
        gatehouse
            .rate_limit_status(ip("203.0.113.9"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_unblocked_range_allows_login() {
    let gatehouse = setup().await;
    let entry = gatehouse.block_address(ip("::1")).await.unwrap();

    let blocked = gatehouse
        .login("ops@example.com", SECRET, ip("127.0.0.1"))
        .await;
    assert_eq!(blocked.rejection_message(), Some(IP_BLOCKED));

    assert!(gatehouse.set_range_active(entry.id, false).await.unwrap());
    let allowed = gatehouse
        .login("ops@example.com", SECRET, ip("::1"))
        .await;
    assert!(allowed.is_proceed());
}

#[tokio::test]
async fn test_sixth_attempt_is_rate_limited() {
    let gatehouse = setup().await;
    let source = ip("198.51.100.20");

    for _ in 0..5 {
        let outcome = gatehouse
            .login("ops@example.com", "wrong password", source)
            .await;
        assert_eq!(outcome.rejection_message(), Some(CREDENTIAL_FAILURE));
    }

    // Even the correct secret is throttled now
    let outcome = gatehouse.login("ops@example.com", SECRET, source).await;
    assert_eq!(outcome.rejection_message(), Some(RATE_LIMITED));

    let record = gatehouse.rate_limit_status(source).await.unwrap().unwrap();
    assert_eq!(record.attempt_count, 6);

    // Other addresses are unaffected
    assert!(
        gatehouse
            .login("ops@example.com", SECRET, ip("198.51.100.21"))
            .await
            .is_proceed()
    );

    assert!(gatehouse.reset_rate_limit(source).await.unwrap());
    assert!(
        gatehouse
            .login("ops@example.com", SECRET, source)
            .await
            .is_proceed()
    );
}

#[tokio::test]
async fn test_successful_login_counts_once() {
    let gatehouse = setup().await;
    let source = ip("192.0.2.50");

    assert!(
        gatehouse
            .login("ops@example.com", SECRET, source)
            .await
            .is_proceed()
    );

    let record = gatehouse.rate_limit_status(source).await.unwrap().unwrap();
    assert_eq!(record.attempt_count, 1);
}

#[tokio::test]
async fn test_unknown_role_is_rejected() {
    let gatehouse = setup().await;
    gatehouse
        .create_user("vendor@example.com", SECRET, Role::from("vendor".to_string()))
        .await
        .unwrap();

    let outcome = gatehouse
        .login("vendor@example.com", SECRET, ip("192.0.2.10"))
        .await;
    assert_eq!(outcome.rejection_message(), Some(CREDENTIAL_FAILURE));
}

#[tokio::test]
async fn test_logout_ends_session() {
    let gatehouse = setup().await;

    let outcome = gatehouse
        .login("ops@example.com", SECRET, ip("192.0.2.10"))
        .await;
    let token = outcome.success().unwrap().session.token.clone();

    gatehouse.logout(&token).await.unwrap();
    assert!(gatehouse.get_session(&token).await.unwrap().is_none());
    assert!(
        gatehouse
            .get_session(&SessionToken::new("made-up"))
            .await
            .unwrap()
            .is_none()
    );
}

struct StaffOnly;

#[async_trait]
impl LoginCheck for StaffOnly {
    fn name(&self) -> &'static str {
        "staff_only"
    }

    fn failure_message(&self) -> &str {
        "This portal is for staff."
    }

    async fn check(&self, _attempt: &LoginAttempt, user: Option<&UserRecord>) -> CheckResult {
        match user {
            Some(user) if user.role != Role::Staff => CheckResult::fail(self.failure_message()),
            _ => CheckResult::pass(),
        }
    }
}

#[tokio::test]
async fn test_post_check_sees_verified_user() {
    let gatehouse = setup().await.with_post_check(StaffOnly);

    let staff = gatehouse
        .login("ops@example.com", SECRET, ip("192.0.2.10"))
        .await;
    assert!(staff.is_proceed());

    let customer = gatehouse
        .login("shopper@example.com", SECRET, ip("192.0.2.11"))
        .await;
    assert_eq!(
        customer.rejection_message(),
        Some("This portal is for staff.")
    );
}
