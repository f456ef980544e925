use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use gatehouse::{Gatehouse, RepositoryProvider};

use crate::{error::ApiError, extractors::SessionTokenFromRequest};

pub struct AuthState<R: RepositoryProvider> {
    pub gatehouse: Arc<Gatehouse<R>>,
}

impl<R: RepositoryProvider> Clone for AuthState<R> {
    fn clone(&self) -> Self {
        Self {
            gatehouse: self.gatehouse.clone(),
        }
    }
}

/// Reject requests that do not carry a live session.
///
/// On success the [`AuthenticatedSession`](gatehouse::AuthenticatedSession)
/// is stored in the request extensions for
/// [`CurrentSession`](crate::CurrentSession) to pick up.
pub async fn require_session<R>(
    State(state): State<AuthState<R>>,
    SessionTokenFromRequest(token): SessionTokenFromRequest,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    R: RepositoryProvider,
{
    let token = token.ok_or(ApiError::Unauthorized)?;

    let session = state
        .gatehouse
        .get_session(&token)
        .await?
        .ok_or_else(|| {
            tracing::debug!("Request with unknown or expired session");
            ApiError::Unauthorized
        })?;

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}
