//! Authenticated sessions
//!
//! A session exists only after both check phases and credential verification
//! have passed. The plaintext token is handed to the client once; storage only
//! ever sees its SHA-256 digest.
//!
//! | Field            | Type            | Description                                 |
//! | ---------------- | --------------- | ------------------------------------------- |
//! | `token`          | `SessionToken`  | Bearer secret, empty when loaded by user.   |
//! | `user_id`        | `UserId`        | The authenticated user.                     |
//! | `role`           | `Role`          | Role at the time of login.                  |
//! | `source_address` | `SourceAddress` | Canonical address the login came from.      |
//! | `created_at`     | `DateTime`      | When the session was established.           |
//! | `expires_at`     | `DateTime`      | When the session stops being valid.         |
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    address::SourceAddress,
    crypto::{generate_secure_token, hash_token, verify_token_hash},
    user::{Role, UserId},
};

/// Opaque session token with 256 bits of entropy.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a token received from a client.
    pub fn new(token: &str) -> Self {
        Self(token.to_string())
    }

    pub fn new_random() -> Self {
        Self(generate_secure_token())
    }

    /// A placeholder for sessions loaded without their plaintext token.
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Digest under which the token is stored.
    pub fn token_hash(&self) -> String {
        hash_token(&self.0)
    }

    /// Constant-time check of this token against a stored digest.
    pub fn verify_hash(&self, stored_hash: &str) -> bool {
        verify_token_hash(&self.0, stored_hash)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedSession {
    #[serde(skip_serializing)]
    pub token: SessionToken,
    pub user_id: UserId,
    pub role: Role,
    pub source_address: SourceAddress,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AuthenticatedSession {
    /// A fresh session with a newly generated token.
    pub fn establish(
        user_id: UserId,
        role: Role,
        source_address: SourceAddress,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            token: SessionToken::new_random(),
            user_id,
            role,
            source_address,
            created_at: now,
            expires_at: now + expires_in,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_establish_session() {
        let session = AuthenticatedSession::establish(
            UserId::new_random(),
            Role::Staff,
            SourceAddress::parse("10.1.2.3").unwrap(),
            Duration::hours(8),
        );

        assert!(!session.token.is_empty());
        assert!(!session.is_expired());
        assert!(session.token.verify_hash(&session.token.token_hash()));
    }

    #[test]
    fn test_expired_session() {
        let mut session = AuthenticatedSession::establish(
            UserId::new_random(),
            Role::Customer,
            SourceAddress::parse("10.1.2.3").unwrap(),
            Duration::hours(1),
        );
        session.expires_at = Utc::now() - Duration::seconds(1);
        assert!(session.is_expired());
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = SessionToken::new("super-secret-token");
        assert!(!format!("{token:?}").contains("super-secret"));
    }
}
