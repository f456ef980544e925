use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use gatehouse::{Gatehouse, LoginOutcome, RepositoryProvider};

use crate::{
    error::{ApiError, Result},
    extractors::{ClientAddress, CurrentSession, SessionTokenFromRequest},
    middleware::{AuthState, require_session},
    types::*,
};

pub fn create_router<R>(gatehouse: Arc<Gatehouse<R>>, cookie_config: CookieConfig) -> Router
where
    R: RepositoryProvider + 'static,
{
    let state = AuthState { gatehouse };

    let session_routes = Router::new()
        .route("/session", get(get_session_handler))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_session::<R>,
        ));

    Router::new()
        .route("/health", get(health_handler::<R>))
        .route("/login", post(login_handler::<R>))
        .route("/logout", post(logout_handler::<R>))
        .merge(session_routes)
        .with_state(state)
        .layer(Extension(cookie_config))
}

async fn health_handler<R>(State(state): State<AuthState<R>>) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    state.gatehouse.health_check().await?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

async fn login_handler<R>(
    State(state): State<AuthState<R>>,
    Extension(cookie_config): Extension<CookieConfig>,
    ClientAddress(source): ClientAddress,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let success = match state
        .gatehouse
        .login(&payload.username, &payload.password, source)
        .await
    {
        LoginOutcome::Proceed(success) => success,
        LoginOutcome::Reject(rejection) => return Err(ApiError::LoginRejected(rejection.message)),
    };

    let cookie = Cookie::build((cookie_config.name, success.session.token.as_str().to_owned()))
        .path(cookie_config.path)
        .http_only(cookie_config.http_only)
        .secure(cookie_config.secure)
        .same_site(same_site(cookie_config.same_site));

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(LoginResponse::from(&success)),
    ))
}

async fn get_session_handler(CurrentSession(session): CurrentSession) -> impl IntoResponse {
    Json(SessionResponse { session })
}

async fn logout_handler<R>(
    State(state): State<AuthState<R>>,
    Extension(cookie_config): Extension<CookieConfig>,
    jar: CookieJar,
    SessionTokenFromRequest(session_token): SessionTokenFromRequest,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    if let Some(session_token) = session_token {
        state.gatehouse.logout(&session_token).await?;
    }

    let jar = jar.remove(Cookie::build(cookie_config.name).path(cookie_config.path));

    Ok((
        jar,
        Json(MessageResponse {
            message: "Successfully logged out".to_string(),
        }),
    ))
}

fn same_site(value: CookieSameSite) -> SameSite {
    match value {
        CookieSameSite::Strict => SameSite::Strict,
        CookieSameSite::Lax => SameSite::Lax,
        CookieSameSite::None => SameSite::None,
    }
}
