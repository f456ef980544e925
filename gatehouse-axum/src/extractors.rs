use std::net::{IpAddr, SocketAddr};

use axum::{
    RequestPartsExt,
    extract::{ConnectInfo, FromRequestParts},
    http::{StatusCode, request::Parts},
};
use axum_extra::extract::CookieJar;
use gatehouse::{AuthenticatedSession, SessionToken};

use crate::{error::ApiError, types::CookieConfig};

/// Peer address of the connection the request arrived on.
///
/// Requires the service to be built with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub struct ClientAddress(pub IpAddr);

impl<S> FromRequestParts<S> for ClientAddress
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ConnectInfo(addr) = parts
            .extract::<ConnectInfo<SocketAddr>>()
            .await
            .map_err(|_| ApiError::InternalError("Client address unavailable".to_string()))?;

        Ok(ClientAddress(addr.ip()))
    }
}

/// Session token from a `Bearer` authorization header, falling back to the
/// session cookie.
pub struct SessionTokenFromRequest(pub Option<SessionToken>);

impl<S> FromRequestParts<S> for SessionTokenFromRequest
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(token) = bearer_token(parts) {
            return Ok(SessionTokenFromRequest(Some(token)));
        }

        let jar = parts
            .extract::<CookieJar>()
            .await
            .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid cookie header"))?;

        let name = parts
            .extensions
            .get::<CookieConfig>()
            .map(|config| config.name.clone())
            .unwrap_or_else(|| CookieConfig::default().name);

        let session_token = jar
            .get(&name)
            .map(|cookie| cookie.value())
            .filter(|value| !value.is_empty())
            .map(SessionToken::new);

        Ok(SessionTokenFromRequest(session_token))
    }
}

fn bearer_token(parts: &Parts) -> Option<SessionToken> {
    parts
        .headers
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(SessionToken::new)
}

/// The session resolved by [`require_session`](crate::require_session).
pub struct CurrentSession(pub AuthenticatedSession);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedSession>()
            .cloned()
            .map(CurrentSession)
            .ok_or(ApiError::Unauthorized)
    }
}
