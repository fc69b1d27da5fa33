//! Session endpoints and the coordinator behind them.
//!
//! Flow Overview:
//! 1) `/api/login` checks the password and hands out an access token plus a
//!    stored refresh token.
//! 2) `/api/refresh` trades a live refresh token for a new access token. The
//!    refresh token itself is not rotated.
//! 3) `/api/revoke` marks a refresh token revoked; later refreshes fail.
//!
//! Protected handlers call [`authenticate`] to turn the bearer header into a
//! user id and [`authorize_owner`] before mutating owned resources.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    AuthError, AuthState,
    bearer::extract_bearer_token,
    refresh_token,
    types::{LoginRequest, LoginResponse, TokenResponse},
    utils::normalize_email,
};
use crate::{
    api::{error::ApiError, handlers::users::UserResponse},
    storage::{RefreshTokenStore, SharedStorage, UserRecord, UserStore},
};

/// Result of a successful password login.
#[derive(Debug)]
pub struct LoginSession {
    pub user: UserRecord,
    pub access_token: String,
    pub refresh_token: String,
}

/// Check credentials and open a session.
///
/// Unknown emails still pay for one hash verification.
///
/// # Errors
/// `InvalidCredentials` for an unknown email or wrong password; `Storage` or
/// `Internal` when a dependency fails.
pub async fn login_user<S>(
    auth_state: &AuthState,
    store: &S,
    email: &str,
    password: &str,
) -> Result<LoginSession, AuthError>
where
    S: UserStore + RefreshTokenStore + ?Sized,
{
    let email = normalize_email(email);
    let user = store
        .find_user_by_email(&email)
        .await
        .map_err(AuthError::Storage)?;

    let stored_hash = user.as_ref().map(|user| user.hashed_password.clone());
    let verified = auth_state
        .hasher()
        .verify_blocking(password.to_string(), stored_hash)
        .await
        .map_err(AuthError::Internal)?;

    let user = match user {
        Some(user) if verified => user,
        _ => {
            debug!("Login rejected");
            return Err(AuthError::InvalidCredentials);
        }
    };

    let access_token = auth_state.access_tokens().issue(user.id)?;
    let refresh_token =
        refresh_token::issue(store, user.id, auth_state.refresh_token_ttl()).await?;

    info!(user_id = %user.id, "User logged in");
    Ok(LoginSession {
        user,
        access_token,
        refresh_token,
    })
}

/// Issue a new access token for the owner of a live refresh token.
///
/// # Errors
/// `NotFound`, `Revoked` or `Expired` from the refresh token lookup.
pub async fn refresh_access_token<S>(
    auth_state: &AuthState,
    store: &S,
    token: &str,
) -> Result<String, AuthError>
where
    S: RefreshTokenStore + ?Sized,
{
    let user_id = refresh_token::resolve(store, token).await?;
    Ok(auth_state.access_tokens().issue(user_id)?)
}

/// Revoke a refresh token (logout).
///
/// # Errors
/// `NotFound` for unknown tokens.
pub async fn revoke_session<S>(store: &S, token: &str) -> Result<(), AuthError>
where
    S: RefreshTokenStore + ?Sized,
{
    refresh_token::revoke(store, token).await?;
    info!("Refresh token revoked");
    Ok(())
}

/// Resolve the bearer access token on a request to its subject.
///
/// The header shape is checked before any token parsing.
///
/// # Errors
/// Header or access token failures.
pub fn authenticate(auth_state: &AuthState, headers: &HeaderMap) -> Result<Uuid, AuthError> {
    let token = extract_bearer_token(headers)?;
    Ok(auth_state.access_tokens().verify(token)?)
}

/// # Errors
/// `Forbidden` when `subject` does not own the resource.
pub fn authorize_owner(subject: Uuid, owner_id: Uuid) -> Result<(), AuthError> {
    if subject == owner_id {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Invalid request body"),
        (status = 401, description = "Incorrect email or password")
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(auth_state): Extension<Arc<AuthState>>,
    Extension(storage): Extension<SharedStorage>,
    payload: Option<Json<LoginRequest>>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::BadRequest("Invalid request body".to_string()));
    };

    let session = login_user(
        &auth_state,
        &*storage,
        &request.email,
        &request.password,
    )
    .await?;

    Ok(Json(LoginResponse {
        user: UserResponse::from(session.user),
        token: session.access_token,
        refresh_token: session.refresh_token,
    }))
}

#[utoipa::path(
    post,
    path = "/api/refresh",
    responses(
        (status = 200, description = "New access token", body = TokenResponse),
        (status = 400, description = "Malformed authorization header"),
        (status = 401, description = "Refresh token missing, unknown, revoked or expired")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn refresh(
    headers: HeaderMap,
    Extension(auth_state): Extension<Arc<AuthState>>,
    Extension(storage): Extension<SharedStorage>,
) -> Result<Json<TokenResponse>, AuthError> {
    let token = extract_bearer_token(&headers)?;
    let token = refresh_access_token(&auth_state, &*storage, token).await?;
    Ok(Json(TokenResponse { token }))
}

#[utoipa::path(
    post,
    path = "/api/revoke",
    responses(
        (status = 204, description = "Refresh token revoked"),
        (status = 400, description = "Malformed authorization header"),
        (status = 401, description = "Refresh token missing or unknown")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn revoke(
    headers: HeaderMap,
    Extension(storage): Extension<SharedStorage>,
) -> Result<impl IntoResponse, AuthError> {
    let token = extract_bearer_token(&headers)?;
    revoke_session(&*storage, token).await?;
    Ok(StatusCode::NO_CONTENT)
}
