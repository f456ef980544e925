//! User records as seen by the login pipeline
//!
//! The credential store owns these records; the pipeline only reads them.
//!
//! | Field           | Type     | Description                                        |
//! | --------------- | -------- | -------------------------------------------------- |
//! | `id`            | `UserId` | Stable, opaque identifier.                         |
//! | `login`         | `String` | Normalised login identifier (email or username).  |
//! | `password_hash` | `String` | Salted PHC password hash.                          |
//! | `role`          | `Role`   | Decides where an authenticated user lands.         |
use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{generate_prefixed_id, validate_prefixed_id};

/// A unique, stable identifier for a user.
///
/// Treat the value as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: &str) -> Self {
        UserId(id.to_string())
    }

    pub fn new_random() -> Self {
        UserId(generate_prefixed_id("usr"))
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this ID has the correct format for a user ID
    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "usr")
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of an account.
///
/// Roles are stored as free text, so a value the application does not know
/// about is representable as [`Role::Unrecognized`] rather than failing to load.
/// Such accounts can never complete a login.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Role {
    Staff,
    Customer,
    Unrecognized(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Staff => "staff",
            Role::Customer => "customer",
            Role::Unrecognized(other) => other,
        }
    }

    /// Landing destination for this role, if it has one.
    pub fn landing(&self) -> Option<Landing> {
        match self {
            Role::Staff => Some(Landing::StaffDashboard),
            Role::Customer => Some(Landing::CustomerPortal),
            Role::Unrecognized(_) => None,
        }
    }
}

impl FromStr for Role {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "staff" => Role::Staff,
            "customer" => Role::Customer,
            _ => Role::Unrecognized(s.to_string()),
        })
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(role) => role,
            Err(never) => match never {},
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a freshly authenticated user is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Landing {
    StaffDashboard,
    CustomerPortal,
}

impl Landing {
    pub fn path(&self) -> &'static str {
        match self {
            Landing::StaffDashboard => "/dashboard",
            Landing::CustomerPortal => "/account",
        }
    }
}

/// A user record resolved from the credential store.
#[derive(Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub login: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("login", &self.login)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Input for creating a user record. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub id: UserId,
    pub login: String,
    pub password_hash: String,
    pub role: Role,
}

impl NewUserRecord {
    pub fn new(login: &str, password_hash: String, role: Role) -> Self {
        Self {
            id: UserId::new_random(),
            login: crate::validation::normalize_login(login),
            password_hash,
            role,
        }
    }
}
