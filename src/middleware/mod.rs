use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

pub mod auth;

use crate::{error::AppError, models::User, state::AppState};

/// The signed-in user, put into request extensions by the auth middleware.
pub struct AuthenticatedUser(pub User);

/// The raw bearer token of the current request, needed to sign it out.
#[derive(Clone)]
pub struct SessionToken(pub String);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<User>()
            .cloned()
            .ok_or(AppError::Authentication("user session".to_string()))?;
        Ok(AuthenticatedUser(user))
    }
}

impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionToken>()
            .cloned()
            .ok_or(AppError::Authentication("session token".to_string()))
    }
}

/// Resolves a session token to its user. Shared by the middleware and the
/// live socket, which carries its token in the query string.
pub fn authenticate_token(app_state: &AppState, token: &str) -> Result<User, AppError> {
    if app_state.storage.users.is_token_revoked(token) {
        return Err(AppError::Authentication("Session has been signed out".to_string()));
    }

    let claims = app_state.auth.decode_token(token).map_err(|e| {
        log::warn!("JWT validation failed: {}", e);
        AppError::Authentication("JWT token invalid".to_string())
    })?;

    app_state
        .storage
        .users
        .get_user(&claims.sub)
        .ok_or_else(|| AppError::Authentication("User not found".to_string()))
}

pub async fn jwt_auth_middleware_user(
    State(app_state): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let token = parts
        .headers
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|s| s.to_string())
        .ok_or(AppError::Authentication("Unauthorized".to_string()))?;

    let user = authenticate_token(&app_state, &token)?;
    parts.extensions.insert(user);
    parts.extensions.insert(SessionToken(token));

    let req = Request::from_parts(parts, body);
    Ok(next.run(req).await)
}
