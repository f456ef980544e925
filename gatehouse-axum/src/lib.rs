//! # Gatehouse Axum Integration
//!
//! HTTP routes and middleware for the Gatehouse login pipeline.
//!
//! - `POST /login` decides an attempt from a JSON `{username, password}` body
//!   and the connection's peer address, and sets the session cookie on success
//! - `POST /logout` ends the session and clears the cookie
//! - `GET /session` returns the current session
//! - `GET /health` checks storage
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::{net::SocketAddr, sync::Arc};
//! use axum::{Router, middleware, routing::get};
//! use gatehouse::{GatehouseBuilder, SqliteRepositoryProvider};
//! use gatehouse_axum::{AuthState, CookieConfig, require_session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gatehouse = Arc::new(
//!         GatehouseBuilder::new()
//!             .with_sqlite("sqlite://gatehouse.db")
//!             .await?
//!             .apply_migrations(true)
//!             .build()
//!             .await?,
//!     );
//!
//!     let auth_routes = gatehouse_axum::routes(gatehouse.clone())
//!         .with_cookie_config(CookieConfig::development());
//!
//!     let protected = Router::new()
//!         .route("/dashboard", get(|| async { "staff only" }))
//!         .route_layer(middleware::from_fn_with_state(
//!             AuthState { gatehouse },
//!             require_session::<SqliteRepositoryProvider>,
//!         ));
//!
//!     let app = Router::new()
//!         .nest("/auth", auth_routes.build())
//!         .merge(protected);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(
//!         listener,
//!         app.into_make_service_with_connect_info::<SocketAddr>(),
//!     )
//!     .await?;
//!     Ok(())
//! }
//! ```

mod error;
mod extractors;
mod middleware;
mod routes;
mod types;

pub use error::{ApiError, Result};
pub use extractors::{ClientAddress, CurrentSession, SessionTokenFromRequest};
pub use middleware::{AuthState, require_session};
pub use routes::create_router;
pub use types::{
    CookieConfig, CookieSameSite, HealthResponse, LoginRequest, LoginResponse, MessageResponse,
    SessionResponse,
};

use axum::Router;
use gatehouse::{Gatehouse, RepositoryProvider};
use std::sync::Arc;

/// Create the login routes for an Axum application.
///
/// The returned router can be nested at any path (e.g., "/auth"). The server
/// must provide `ConnectInfo<SocketAddr>`, since every attempt is checked
/// against its source address.
pub fn routes<R>(gatehouse: Arc<Gatehouse<R>>) -> AuthRouterBuilder<R>
where
    R: RepositoryProvider + 'static,
{
    AuthRouterBuilder {
        gatehouse,
        cookie_config: CookieConfig::default(),
    }
}

/// Builder for configuring the login routes
pub struct AuthRouterBuilder<R: RepositoryProvider> {
    gatehouse: Arc<Gatehouse<R>>,
    cookie_config: CookieConfig,
}

impl<R: RepositoryProvider + 'static> AuthRouterBuilder<R> {
    /// Set custom cookie configuration
    pub fn with_cookie_config(mut self, config: CookieConfig) -> Self {
        self.cookie_config = config;
        self
    }

    /// Build the router with the configured options
    pub fn build(self) -> Router {
        create_router(self.gatehouse, self.cookie_config)
    }
}

impl<R: RepositoryProvider + 'static> From<AuthRouterBuilder<R>> for Router {
    fn from(builder: AuthRouterBuilder<R>) -> Self {
        builder.build()
    }
}
