use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User already exists")]
    UserAlreadyExists,

    #[error("No landing destination for role: {0}")]
    UnknownRole(String),

    #[error("Password hash error: {0}")]
    PasswordHashError(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid login identifier: {0}")]
    InvalidLogin(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid address range: {0}")]
    InvalidRange(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}
