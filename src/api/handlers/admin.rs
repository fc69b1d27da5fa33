//! File-server hit counter and the admin pages built on it.

use axum::{
    Json,
    extract::{Extension, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::{
    api::error::{ApiError, json_error},
    storage::SharedStorage,
};

/// Deployment flavour; destructive admin routes only run on `Dev`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Platform {
    Dev,
    #[default]
    Prod,
}

impl Platform {
    /// Anything other than `dev` is treated as production.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("dev") {
            Self::Dev
        } else {
            Self::Prod
        }
    }
}

#[derive(Debug, Default)]
pub struct AdminState {
    hits: AtomicU64,
    platform: Platform,
}

impl AdminState {
    #[must_use]
    pub fn new(platform: Platform) -> Self {
        Self {
            hits: AtomicU64::new(0),
            platform,
        }
    }

    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn reset_hits(&self) {
        self.hits.store(0, Ordering::Relaxed);
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResetResponse {
    pub message: String,
}

/// Middleware for the static file server: one hit per request.
pub async fn count_hits(
    State(admin): State<Arc<AdminState>>,
    request: Request,
    next: Next,
) -> Response {
    admin.record_hit();
    next.run(request).await
}

#[utoipa::path(
    get,
    path = "/admin/metrics",
    responses(
        (status = 200, description = "File server hit count", body = String, content_type = "text/html")
    ),
    tag = "admin"
)]
pub async fn metrics(Extension(admin): Extension<Arc<AdminState>>) -> Html<String> {
    Html(format!(
        r"<html>
  <body>
    <h1>Welcome, Chirpy Admin</h1>
    <p>Chirpy has been visited {} times!</p>
  </body>
</html>
",
        admin.hits()
    ))
}

#[utoipa::path(
    post,
    path = "/admin/reset",
    responses(
        (status = 200, description = "All users deleted and counter reset", body = ResetResponse),
        (status = 403, description = "Reset is only allowed on the dev platform")
    ),
    tag = "admin"
)]
pub async fn reset(
    Extension(admin): Extension<Arc<AdminState>>,
    Extension(storage): Extension<SharedStorage>,
) -> Result<Response, ApiError> {
    if admin.platform() != Platform::Dev {
        warn!("Rejected reset outside the dev platform");
        return Ok(json_error(
            StatusCode::FORBIDDEN,
            "Reset is only allowed in dev environment",
        ));
    }

    let deleted = storage.delete_all_users().await?;
    admin.reset_hits();
    info!(deleted_users = deleted, "Reset users and hit counter");

    Ok(Json(ResetResponse {
        message: "Counter reset".to_string(),
    })
    .into_response())
}
