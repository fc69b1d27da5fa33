//! Chirp endpoints.
//!
//! Reads are public. Creating a chirp needs an access token, and deleting one
//! also needs the caller to be its author.

pub mod filter;

use axum::{
    extract::{Extension, Json, Path, Query},
    http::{HeaderMap, StatusCode},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::auth::{AuthState, authorize_owner, principal::require_auth};
use crate::{
    api::error::ApiError,
    storage::{ChirpRecord, SharedStorage, SortOrder},
};

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChirpResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
    pub user_id: Uuid,
}

impl From<ChirpRecord> for ChirpResponse {
    fn from(chirp: ChirpRecord) -> Self {
        Self {
            id: chirp.id,
            created_at: chirp.created_at,
            updated_at: chirp.updated_at,
            body: chirp.body,
            user_id: chirp.user_id,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ChirpRequest {
    pub body: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ValidateChirpResponse {
    pub cleaned_body: String,
}

#[derive(IntoParams, Deserialize, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct ListChirpsQuery {
    /// Only chirps written by this user.
    pub author_id: Option<String>,
    /// `asc` (default) or `desc` by creation time.
    pub sort: Option<String>,
}

fn parse_uuid(value: &str, message: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value).map_err(|_| ApiError::BadRequest(message.to_string()))
}

fn parse_sort(value: Option<&str>) -> Result<SortOrder, ApiError> {
    match value.map(str::to_ascii_lowercase).as_deref() {
        None | Some("asc") => Ok(SortOrder::Asc),
        Some("desc") => Ok(SortOrder::Desc),
        Some(_) => Err(ApiError::BadRequest(
            "sort must be 'asc' or 'desc'".to_string(),
        )),
    }
}

fn cleaned_body(payload: Option<Json<ChirpRequest>>) -> Result<String, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::BadRequest("Invalid request body".to_string()));
    };
    if filter::too_long(&request.body) {
        return Err(ApiError::BadRequest("Chirp is too long".to_string()));
    }
    Ok(filter::clean_body(&request.body))
}

#[utoipa::path(
    post,
    path = "/api/validate_chirp",
    request_body = ChirpRequest,
    responses(
        (status = 200, description = "Chirp is valid", body = ValidateChirpResponse),
        (status = 400, description = "Chirp is too long")
    ),
    tag = "chirps"
)]
pub async fn validate_chirp(
    payload: Option<Json<ChirpRequest>>,
) -> Result<Json<ValidateChirpResponse>, ApiError> {
    let cleaned_body = cleaned_body(payload)?;
    Ok(Json(ValidateChirpResponse { cleaned_body }))
}

#[utoipa::path(
    post,
    path = "/api/chirps",
    request_body = ChirpRequest,
    responses(
        (status = 201, description = "Chirp created", body = ChirpResponse),
        (status = 400, description = "Chirp is too long or malformed authorization header"),
        (status = 401, description = "Missing or invalid access token")
    ),
    security(("bearer_auth" = [])),
    tag = "chirps"
)]
pub async fn create_chirp(
    headers: HeaderMap,
    Extension(auth_state): Extension<Arc<AuthState>>,
    Extension(storage): Extension<SharedStorage>,
    payload: Option<Json<ChirpRequest>>,
) -> Result<(StatusCode, Json<ChirpResponse>), ApiError> {
    let principal = require_auth(&headers, &auth_state)?;
    let body = cleaned_body(payload)?;

    let chirp = storage.insert_chirp(principal.user_id, &body).await?;
    info!(chirp_id = %chirp.id, user_id = %chirp.user_id, "Chirp created");
    Ok((StatusCode::CREATED, Json(ChirpResponse::from(chirp))))
}

#[utoipa::path(
    get,
    path = "/api/chirps",
    params(ListChirpsQuery),
    responses(
        (status = 200, description = "Chirps ordered by creation time", body = [ChirpResponse]),
        (status = 400, description = "Invalid author_id or sort")
    ),
    tag = "chirps"
)]
pub async fn list_chirps(
    Extension(storage): Extension<SharedStorage>,
    query: Option<Query<ListChirpsQuery>>,
) -> Result<Json<Vec<ChirpResponse>>, ApiError> {
    let query = query.map(|Query(query)| query).unwrap_or_default();
    let author = query
        .author_id
        .as_deref()
        .map(|value| parse_uuid(value, "Invalid author_id"))
        .transpose()?;
    let order = parse_sort(query.sort.as_deref())?;

    let chirps = storage.list_chirps(author, order).await?;
    Ok(Json(chirps.into_iter().map(ChirpResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/chirps/{chirp_id}",
    params(("chirp_id" = String, Path, description = "Chirp id (UUID)")),
    responses(
        (status = 200, description = "Chirp", body = ChirpResponse),
        (status = 400, description = "Invalid chirp ID format"),
        (status = 404, description = "Chirp not found")
    ),
    tag = "chirps"
)]
pub async fn get_chirp(
    Path(chirp_id): Path<String>,
    Extension(storage): Extension<SharedStorage>,
) -> Result<Json<ChirpResponse>, ApiError> {
    let chirp_id = parse_uuid(&chirp_id, "Invalid chirp ID format")?;
    let chirp = storage
        .find_chirp(chirp_id)
        .await?
        .ok_or(ApiError::NotFound("Chirp not found"))?;
    Ok(Json(ChirpResponse::from(chirp)))
}

#[utoipa::path(
    delete,
    path = "/api/chirps/{chirp_id}",
    params(("chirp_id" = String, Path, description = "Chirp id (UUID)")),
    responses(
        (status = 204, description = "Chirp deleted"),
        (status = 400, description = "Invalid chirp ID format or malformed authorization header"),
        (status = 401, description = "Missing or invalid access token"),
        (status = 403, description = "Caller is not the author"),
        (status = 404, description = "Chirp not found")
    ),
    security(("bearer_auth" = [])),
    tag = "chirps"
)]
pub async fn delete_chirp(
    headers: HeaderMap,
    Path(chirp_id): Path<String>,
    Extension(auth_state): Extension<Arc<AuthState>>,
    Extension(storage): Extension<SharedStorage>,
) -> Result<StatusCode, ApiError> {
    let principal = require_auth(&headers, &auth_state)?;
    let chirp_id = parse_uuid(&chirp_id, "Invalid chirp ID format")?;

    let chirp = storage
        .find_chirp(chirp_id)
        .await?
        .ok_or(ApiError::NotFound("Chirp not found"))?;
    authorize_owner(principal.user_id, chirp.user_id)?;

    if !storage.delete_chirp(chirp_id).await? {
        // Deleted concurrently between lookup and delete.
        return Err(ApiError::NotFound("Chirp not found"));
    }
    info!(chirp_id = %chirp_id, user_id = %principal.user_id, "Chirp deleted");
    Ok(StatusCode::NO_CONTENT)
}
