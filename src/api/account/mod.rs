use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use log::info;
use serde_json::json;

use crate::{
    error::{AccountError, AppError},
    middleware::{
        AuthenticatedUser, SessionToken,
        auth::{hash_password, verify_password},
    },
    models::User,
    schema::{AccountResponse, Credentials, SessionResponse},
    state::AppState,
    utils::{looks_like_email, normalize_email},
};

fn issue_session(state: &AppState, user: &User) -> Result<SessionResponse, AppError> {
    let (token, expires_in) = state.auth.create_token(&user.uid)?;
    Ok(SessionResponse {
        token,
        expires_in,
        uid: user.uid.clone(),
        email: user.email.clone(),
    })
}

pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(credentials): Json<Credentials>,
) -> Result<impl IntoResponse, AppError> {
    let email = normalize_email(&credentials.email);
    if !looks_like_email(&email) {
        return Err(AccountError::InvalidEmail.into());
    }
    let min_len = state.config.min_password_len;
    if credentials.password.chars().count() < min_len {
        return Err(AccountError::WeakPassword(min_len).into());
    }
    // Checked again atomically on insert; this only skips a pointless hash
    if state.storage.users.find_by_email(&email)?.is_some() {
        return Err(AccountError::EmailAlreadyInUse.into());
    }

    let hash = hash_password(credentials.password, state.config.bcrypt_cost).await?;
    let user = User::new(email, hash);
    state.storage.users.create_user(&user)?;
    info!("Registered user {}", user.uid);

    Ok((StatusCode::CREATED, Json(issue_session(&state, &user)?)))
}

pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(credentials): Json<Credentials>,
) -> Result<impl IntoResponse, AppError> {
    let email = normalize_email(&credentials.email);
    let user = state
        .storage
        .users
        .find_by_email(&email)?
        .ok_or(AccountError::InvalidCredential)?;

    if !verify_password(credentials.password, user.password_hash.clone()).await? {
        return Err(AccountError::InvalidCredential.into());
    }

    let user = state.storage.users.touch_last_login(user)?;
    Ok(Json(issue_session(&state, &user)?))
}

pub async fn sign_out(
    AuthenticatedUser(user): AuthenticatedUser,
    SessionToken(token): SessionToken,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    state.storage.users.revoke_token(token);
    info!("User {} signed out", user.uid);
    Ok(Json(json!({"message": "Signed out"})))
}

/// Client platform as reported by the `Sec-CH-UA-Platform` client hint, or the
/// first parenthesised segment of `User-Agent`.
fn client_platform(headers: &HeaderMap) -> String {
    if let Some(hint) = headers
        .get("Sec-CH-UA-Platform")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().trim_matches('"'))
        .filter(|v| !v.is_empty())
    {
        return hint.to_string();
    }

    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .and_then(|ua| {
            let start = ua.find('(')? + 1;
            let end = start + ua[start..].find(')')?;
            ua[start..end].split(';').next().map(str::trim)
        })
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn get_account(
    AuthenticatedUser(user): AuthenticatedUser,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(AccountResponse {
        uid: user.uid,
        email: user.email,
        created_at: user.created_at,
        last_login_at: user.last_login_at,
        platform: client_platform(&headers),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn platform_prefers_client_hint() {
        let mut headers = HeaderMap::new();
        headers.insert("Sec-CH-UA-Platform", HeaderValue::from_static("\"Windows\""));
        headers.insert(
            "User-Agent",
            HeaderValue::from_static("Mozilla/5.0 (X11; Linux x86_64)"),
        );
        assert_eq!(client_platform(&headers), "Windows");
    }

    #[test]
    fn platform_falls_back_to_user_agent() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "User-Agent",
            HeaderValue::from_static("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) Electron/30"),
        );
        assert_eq!(client_platform(&headers), "Macintosh");
    }

    #[test]
    fn platform_unknown_without_headers() {
        assert_eq!(client_platform(&HeaderMap::new()), "unknown");
        let mut headers = HeaderMap::new();
        headers.insert("User-Agent", HeaderValue::from_static("curl/8.0"));
        assert_eq!(client_platform(&headers), "unknown");
    }
}
