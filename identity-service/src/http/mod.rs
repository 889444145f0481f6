/// REST adapter for the identity service
///
/// Translates HTTP requests into service calls and service outcomes into
/// wire responses. Authorization decisions go through `authz::require`,
/// the same policy the gRPC adapter uses, before the service is invoked.
mod auth;
mod users;

pub use auth::*;
pub use users::*;

use crate::error::IdentityError;
use crate::models::PublicUser;
use crate::security::token::TokenIssuer;
use crate::service::UserService;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Shared HTTP server state
#[derive(Clone)]
pub struct AppState {
    pub service: UserService,
    pub tokens: TokenIssuer,
}

/// The caller behind a validated bearer token.
///
/// Extraction fails with 401 when the Authorization header is missing or
/// not a Bearer scheme, when the token does not validate, or when the
/// token's subject no longer resolves to an account.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub PublicUser);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = IdentityError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(IdentityError::Unauthenticated)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(IdentityError::Unauthenticated)?;

        let subject = state.tokens.validate(token)?;

        let user = state
            .service
            .get_user_by_username(&subject)
            .await?
            .ok_or(IdentityError::Unauthenticated)?;

        Ok(CurrentUser(user))
    }
}

/// Build the HTTP router with all endpoints
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/token", post(auth::login))
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/username/{username}", get(users::get_user_by_username))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint (no auth required)
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Start the HTTP server
pub async fn start_http_server(
    state: AppState,
    host: &str,
    port: u16,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = build_router(state);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Starting HTTP API server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

    Ok(())
}
