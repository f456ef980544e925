//! Cryptographic primitives used by the login pipeline
//!
//! Two concerns live here:
//!
//! 1. Password verification. Stored credentials are salted argon2 PHC strings
//!    produced and checked by the `password-auth` crate, whose verification is
//!    constant-time with respect to the stored hash.
//! 2. Session tokens. A session token is 256 bits of OS randomness encoded as
//!    URL-safe base64. Only the SHA-256 digest of the token is persisted, and
//!    lookups compare digests with `subtle` so the comparison does not exit
//!    early on the first differing byte.

use std::sync::LazyLock;

use rand::{TryRngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::{Error, error::AuthError};

/// Generate a cryptographically secure random token.
///
/// # Panics
///
/// Panics if the OS random number generator fails. There is no safe way to
/// continue issuing sessions without an entropy source.
pub fn generate_secure_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .expect("OS RNG failure - system entropy source unavailable");
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
}

/// Hex-encoded SHA-256 digest of a token, used as its storage key.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verify a token against a stored digest with constant-time comparison.
pub fn verify_token_hash(token: &str, stored_hash: &str) -> bool {
    let computed_hash = hash_token(token);
    constant_time_compare(computed_hash.as_bytes(), stored_hash.as_bytes())
}

/// Constant-time equality over two byte slices.
///
/// Slices of different length compare unequal immediately; the length of a
/// digest is not secret.
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Hash a password into a salted PHC string.
pub fn hash_password(password: &str) -> String {
    password_auth::generate_hash(password)
}

/// Verify a password against a stored PHC string.
///
/// Returns `Ok(false)` on mismatch. A stored hash that cannot be parsed is an
/// error, since it points at corrupted credential data rather than a bad guess.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, Error> {
    match password_auth::verify_password(password, stored_hash) {
        Ok(()) => Ok(true),
        Err(password_auth::VerifyError::PasswordInvalid) => Ok(false),
        Err(e) => Err(Error::Auth(AuthError::PasswordHashError(e.to_string()))),
    }
}

/// Hash verified against when no account exists, so an unknown identifier
/// costs the same argon2 work as a wrong password.
static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| password_auth::generate_hash(generate_secure_token()));

#[cfg(test)]
pub(crate) static DUMMY_VERIFICATIONS: std::sync::atomic::AtomicUsize =
    std::sync::atomic::AtomicUsize::new(0);

/// Run a password verification whose result is discarded.
pub fn verify_dummy_password(password: &str) {
    #[cfg(test)]
    DUMMY_VERIFICATIONS.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

    let _ = password_auth::verify_password(password, &DUMMY_HASH);
}
