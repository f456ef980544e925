//! The inbound login attempt
//!
//! A `LoginAttempt` is created per request and dropped when the flow finishes.
//! It is the request payload every check receives.
use std::fmt;

use crate::{address::SourceAddress, error::ValidationError};

#[derive(Clone)]
pub struct LoginAttempt {
    identifier: String,
    secret: String,
    source: SourceAddress,
}

impl LoginAttempt {
    pub fn new(
        identifier: impl Into<String>,
        secret: impl Into<String>,
        source: SourceAddress,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
            source,
        }
    }

    /// Build an attempt from a textual source address.
    pub fn from_parts(
        identifier: impl Into<String>,
        secret: impl Into<String>,
        source: &str,
    ) -> Result<Self, ValidationError> {
        Ok(Self::new(identifier, secret, SourceAddress::parse(source)?))
    }

    /// The login identifier exactly as submitted.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn source(&self) -> &SourceAddress {
        &self.source
    }
}

impl fmt::Debug for LoginAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginAttempt")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}
