//! Input normalisation and validation for credential data
//!
//! Login identifiers are matched case-insensitively: both account creation and
//! lookup go through [`normalize_login`], so `Ops@Example.com` and
//! `ops@example.com` name the same account.

use crate::error::ValidationError;

const MAX_LOGIN_LEN: usize = 254;
const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;

/// Canonical form of a login identifier (email or username).
pub fn normalize_login(login: &str) -> String {
    login.trim().to_lowercase()
}

/// Validates a login identifier before an account is created.
pub fn validate_login(login: &str) -> Result<(), ValidationError> {
    let login = login.trim();

    if login.is_empty() {
        return Err(ValidationError::MissingField(
            "Login identifier is required".to_string(),
        ));
    }

    if login.len() > MAX_LOGIN_LEN {
        return Err(ValidationError::InvalidLogin(
            "Login identifier is too long".to_string(),
        ));
    }

    if login.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::InvalidLogin(
            "Login identifier must not contain whitespace".to_string(),
        ));
    }

    Ok(())
}

/// Validates a password before it is hashed and stored.
///
/// Only length is enforced; composition rules are left to the caller.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.trim().is_empty() {
        return Err(ValidationError::MissingField(
            "Password is required".to_string(),
        ));
    }

    if password.len() < MIN_PASSWORD_LEN {
        return Err(ValidationError::InvalidPassword(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if password.len() > MAX_PASSWORD_LEN {
        return Err(ValidationError::InvalidPassword(format!(
            "Password must be at most {MAX_PASSWORD_LEN} characters"
        )));
    }

    Ok(())
}
