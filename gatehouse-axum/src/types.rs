use gatehouse::{AuthenticatedSession, LoginSuccess, Role, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: UserId,
    pub role: Role,
    /// Path the client should navigate to next.
    pub landing: String,
}

impl From<&LoginSuccess> for LoginResponse {
    fn from(success: &LoginSuccess) -> Self {
        Self {
            user_id: success.user_id().clone(),
            role: success.role().clone(),
            landing: success.landing.path().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub session: AuthenticatedSession,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: CookieSameSite,
    pub path: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self::new("gatehouse_session")
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub enum CookieSameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl CookieConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            http_only: true,
            secure: true,
            same_site: CookieSameSite::Lax,
            path: "/".to_string(),
        }
    }

    /// Same as the default but allows plain HTTP.
    pub fn development() -> Self {
        Self {
            secure: false,
            ..Self::default()
        }
    }
}
