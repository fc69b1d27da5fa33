//! User registration and profile updates.

use axum::{
    extract::{Extension, Json},
    http::{HeaderMap, StatusCode},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use super::auth::{
    AuthState,
    principal::require_auth,
    utils::{normalize_email, valid_email},
};
use crate::{
    api::error::ApiError,
    storage::{InsertOutcome, SharedStorage, UpdateOutcome, UserRecord},
};

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserCredentials {
    pub email: String,
    pub password: String,
}

/// Validate and normalize the request body shared by create and update.
fn parse_credentials(payload: Option<Json<UserCredentials>>) -> Result<(String, String), ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::BadRequest("Invalid request body".to_string()));
    };
    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return Err(ApiError::BadRequest("Invalid email".to_string()));
    }
    if request.password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".to_string()));
    }
    Ok((email, request.password))
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = UserCredentials,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid email or password"),
        (status = 409, description = "Email already registered")
    ),
    tag = "users"
)]
pub async fn create_user(
    Extension(auth_state): Extension<Arc<AuthState>>,
    Extension(storage): Extension<SharedStorage>,
    payload: Option<Json<UserCredentials>>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let (email, password) = parse_credentials(payload)?;
    let hashed_password = auth_state.hasher().hash_blocking(password).await?;

    match storage.insert_user(&email, &hashed_password).await? {
        InsertOutcome::Created(user) => {
            info!(user_id = %user.id, "User registered");
            Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
        }
        InsertOutcome::Conflict => Err(ApiError::Conflict("Email already registered")),
    }
}

#[utoipa::path(
    put,
    path = "/api/users",
    request_body = UserCredentials,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid email, password or authorization header"),
        (status = 401, description = "Missing or invalid access token"),
        (status = 409, description = "Email already registered")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_user(
    headers: HeaderMap,
    Extension(auth_state): Extension<Arc<AuthState>>,
    Extension(storage): Extension<SharedStorage>,
    payload: Option<Json<UserCredentials>>,
) -> Result<Json<UserResponse>, ApiError> {
    let principal = require_auth(&headers, &auth_state)?;
    let (email, password) = parse_credentials(payload)?;
    let hashed_password = auth_state.hasher().hash_blocking(password).await?;

    match storage
        .update_user(principal.user_id, &email, &hashed_password)
        .await?
    {
        UpdateOutcome::Updated(user) => {
            info!(user_id = %user.id, "User updated");
            Ok(Json(UserResponse::from(user)))
        }
        UpdateOutcome::Conflict => Err(ApiError::Conflict("Email already registered")),
        UpdateOutcome::NotFound => Err(ApiError::NotFound("User not found")),
    }
}
