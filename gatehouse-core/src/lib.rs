//! Core functionality for gatehouse
//!
//! This crate contains the login security pipeline: the [`LoginCheck`]
//! contract, the IP reputation and rate limit checks, the [`SecurityManager`]
//! that runs checks in order, and the [`LoginService`] that composes them with
//! credential verification and session establishment.
//!
//! Storage is abstracted behind the traits in [`repositories`]; see the
//! `gatehouse-storage-sqlite` crate for a concrete backend.
//!
pub mod address;
pub mod attempt;
pub mod checks;
pub mod crypto;
pub mod error;
pub mod id;
pub mod repositories;
pub mod security;
pub mod services;
pub mod session;
pub mod storage;
pub mod user;
pub mod validation;

pub use address::{IpVersion, SourceAddress};
pub use attempt::LoginAttempt;
pub use checks::{
    CheckResult, FailurePolicy, IpReputationCheck, IpReputationConfig, LoginCheck, RateLimitCheck,
    RateLimitConfig,
};
pub use error::Error;
pub use repositories::RepositoryProvider;
pub use security::SecurityManager;
pub use services::{LoginConfig, LoginOutcome, LoginService, LoginSuccess, RejectionMessages};
pub use session::{AuthenticatedSession, SessionToken};
pub use storage::{IpRangeEntry, NewIpRange, RateLimitRecord};
pub use user::{Landing, Role, UserId, UserRecord};
