//! Service layer for business logic
//!
//! This module contains the login flow controller and the account and session
//! services it builds on.

pub mod login;
pub mod session;
pub mod user;

#[cfg(test)]
pub(crate) mod mock;

pub use login::{
    LoginConfig, LoginOutcome, LoginRejection, LoginService, LoginSuccess, RejectionMessages,
};
pub use session::SessionService;
pub use user::UserService;
