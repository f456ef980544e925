//! Login flow controller
//!
//! Drives one attempt through the pipeline:
//!
//! ```text
//! pre-checks (no user) -> credential lookup -> password verification
//!     -> post-checks (resolved user) -> role dispatch -> session
//! ```
//!
//! Every path resolves to a [`LoginOutcome`]. Rejections carry one opaque
//! message; which step rejected, and why, is recorded only in logs. A session
//! is written only on the proceed path.

use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{
    attempt::LoginAttempt,
    crypto::{verify_dummy_password, verify_password},
    error::AuthError,
    repositories::{CredentialRepository, SessionRepository},
    security::SecurityManager,
    services::SessionService,
    session::AuthenticatedSession,
    user::{Landing, Role, UserId},
    validation::normalize_login,
};

pub const CREDENTIAL_FAILURE_MESSAGE: &str = "Invalid username or password.";

/// Text returned to callers on rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionMessages {
    /// Shared by unknown identifiers, wrong secrets, unknown roles and
    /// internal faults, so none of them can be told apart.
    pub credential_failure: String,

    /// Report check failures with `credential_failure` as well, instead of
    /// the failing check's own message.
    pub unified_pre_checks: bool,
}

impl Default for RejectionMessages {
    fn default() -> Self {
        Self {
            credential_failure: CREDENTIAL_FAILURE_MESSAGE.to_string(),
            unified_pre_checks: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginConfig {
    pub session_expiry: Duration,
    pub rejection_messages: RejectionMessages,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            session_expiry: Duration::hours(8),
            rejection_messages: RejectionMessages::default(),
        }
    }
}

/// A successful login: the established session and where to send the user.
#[derive(Debug, Clone)]
pub struct LoginSuccess {
    pub session: AuthenticatedSession,
    pub landing: Landing,
}

impl LoginSuccess {
    pub fn user_id(&self) -> &UserId {
        &self.session.user_id
    }

    pub fn role(&self) -> &Role {
        &self.session.role
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRejection {
    pub message: String,
}

#[derive(Debug, Clone)]
pub enum LoginOutcome {
    Proceed(LoginSuccess),
    Reject(LoginRejection),
}

impl LoginOutcome {
    fn reject(message: impl Into<String>) -> Self {
        LoginOutcome::Reject(LoginRejection {
            message: message.into(),
        })
    }

    pub fn is_proceed(&self) -> bool {
        matches!(self, LoginOutcome::Proceed(_))
    }

    pub fn success(&self) -> Option<&LoginSuccess> {
        match self {
            LoginOutcome::Proceed(success) => Some(success),
            LoginOutcome::Reject(_) => None,
        }
    }

    pub fn rejection_message(&self) -> Option<&str> {
        match self {
            LoginOutcome::Proceed(_) => None,
            LoginOutcome::Reject(rejection) => Some(&rejection.message),
        }
    }
}

/// Service that decides whether a login attempt may proceed.
///
/// The pre-phase manager runs without a user; the post-phase manager runs
/// with the verified user. The post-phase is empty unless checks are added
/// with [`with_post_checks`](Self::with_post_checks). Registering the rate
/// limit check in both phases would count each attempt twice.
pub struct LoginService<C: CredentialRepository, S: SessionRepository> {
    credentials: Arc<C>,
    sessions: Arc<SessionService<S>>,
    pre_checks: SecurityManager,
    post_checks: SecurityManager,
    config: LoginConfig,
}

impl<C: CredentialRepository, S: SessionRepository> LoginService<C, S> {
    pub fn new(
        credentials: Arc<C>,
        sessions: Arc<SessionService<S>>,
        pre_checks: SecurityManager,
        config: LoginConfig,
    ) -> Self {
        Self {
            credentials,
            sessions,
            pre_checks,
            post_checks: SecurityManager::new(),
            config,
        }
    }

    pub fn with_post_checks(mut self, post_checks: SecurityManager) -> Self {
        self.post_checks = post_checks;
        self
    }

    pub fn config(&self) -> &LoginConfig {
        &self.config
    }

    pub fn pre_checks(&self) -> &SecurityManager {
        &self.pre_checks
    }

    pub fn post_checks(&self) -> &SecurityManager {
        &self.post_checks
    }

    /// Run one attempt through the whole pipeline.
    pub async fn login(&self, attempt: &LoginAttempt) -> LoginOutcome {
        let source = attempt.source();

        if let Some(message) = self.pre_checks.run(attempt, None).await {
            return self.check_rejection(message);
        }

        let login = normalize_login(attempt.identifier());
        let user = match self.credentials.find_by_login(&login).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                verify_dummy_password(attempt.secret());
                tracing::warn!(source = %source, reason = "user_not_found", "Credential verification failed");
                return self.credential_rejection();
            }
            Err(e) => {
                verify_dummy_password(attempt.secret());
                tracing::error!(error = %e, source = %source, "Credential lookup failed");
                return self.credential_rejection();
            }
        };

        match verify_password(attempt.secret(), &user.password_hash) {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(
                    user_id = %user.id,
                    source = %source,
                    reason = "password_mismatch",
                    "Credential verification failed"
                );
                return self.credential_rejection();
            }
            Err(e) => {
                tracing::error!(error = %e, user_id = %user.id, "Stored password hash is unusable");
                return self.credential_rejection();
            }
        }

        if let Some(message) = self.post_checks.run(attempt, Some(&user)).await {
            return self.check_rejection(message);
        }

        let Some(landing) = user.role.landing() else {
            let error = AuthError::UnknownRole(user.role.to_string());
            tracing::error!(error = %error, user_id = %user.id, "Login stopped at role dispatch");
            return self.credential_rejection();
        };

        let session = match self
            .sessions
            .create_session(&user, *source, self.config.session_expiry)
            .await
        {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(error = %e, user_id = %user.id, "Failed to establish session");
                return self.credential_rejection();
            }
        };

        tracing::info!(
            user_id = %user.id,
            role = %user.role,
            source = %source,
            landing = landing.path(),
            "Login succeeded"
        );

        LoginOutcome::Proceed(LoginSuccess { session, landing })
    }

    fn check_rejection(&self, message: String) -> LoginOutcome {
        if self.config.rejection_messages.unified_pre_checks {
            return self.credential_rejection();
        }
        LoginOutcome::reject(message)
    }

    fn credential_rejection(&self) -> LoginOutcome {
        LoginOutcome::reject(self.config.rejection_messages.credential_failure.clone())
    }
}
