use crate::{APP_USER_AGENT, GIT_COMMIT_HASH, storage::SharedStorage};
use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderMap, HeaderValue, Method, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    database: String,
}

#[utoipa::path(
    get,
    path = "/api/healthz",
    responses(
        (status = 200, description = "Server is ready", body = String, content_type = "text/plain")
    ),
    tag = "health"
)]
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        "OK",
    )
}

#[utoipa::path(
    get,
    path= "/health",
    responses (
        (status = 200, description = "Storage backend is healthy", body = [Health]),
        (status = 503, description = "Storage backend is unhealthy", body = [Health])
    ),
    tag= "health"
)]
// axum handler for health
pub async fn health(
    method: Method,
    Extension(storage): Extension<SharedStorage>,
) -> impl IntoResponse {
    let result = storage.ping().await.map_err(|err| {
        error!("Failed to ping {} storage: {err:#}", storage.backend());
    });

    let health = Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if result.is_ok() {
            "ok".to_string()
        } else {
            "error".to_string()
        },
    };

    let body = if method == Method::GET {
        Json(&health).into_response()
    } else {
        Body::empty().into_response()
    };

    let short_hash = if health.commit.len() > 7 {
        &health.commit[0..7]
    } else {
        ""
    };

    let headers = format!("{APP_USER_AGENT}:{short_hash}")
        .parse::<HeaderValue>()
        .map(|x_app_header_value| {
            debug!("X-App header: {:?}", x_app_header_value);

            let mut headers = HeaderMap::new();

            headers.insert("X-App", x_app_header_value);

            headers
        })
        .map_err(|err| {
            error!("Failed to parse X-App header: {}", err);
        });

    let headers = headers.unwrap_or_else(|()| HeaderMap::new());

    if result.is_ok() {
        debug!("Storage backend is healthy");
        (StatusCode::OK, headers, body)
    } else {
        debug!("Storage backend is unhealthy");
        (StatusCode::SERVICE_UNAVAILABLE, headers, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn healthz_plain_ok() -> anyhow::Result<()> {
        let response = healthz().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        assert_eq!(&body[..], b"OK");
        Ok(())
    }

    #[tokio::test]
    async fn health_reports_storage_and_app_header() -> anyhow::Result<()> {
        let storage: SharedStorage = Arc::new(MemoryStore::new());
        let response = health(Method::GET, Extension(storage)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        if let Some(value) = response.headers().get("X-App") {
            assert!(value.to_str()?.starts_with(APP_USER_AGENT));
        }

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let health: Health = serde_json::from_slice(&body)?;
        assert_eq!(health.name, env!("CARGO_PKG_NAME"));
        assert_eq!(health.database, "ok");
        Ok(())
    }
}
