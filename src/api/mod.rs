use crate::{
    api::handlers::{
        admin::{self, AdminState},
        auth::{self, AuthState},
        chirps, health, users,
    },
    storage::SharedStorage,
};
use anyhow::Result;
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::{get, post},
};
use std::{path::PathBuf, sync::Arc};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, services::ServeDir, set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;
use utoipa_swagger_ui::SwaggerUi;

pub mod error;
pub mod handlers;
mod openapi;

pub use openapi::openapi;

/// Everything the router needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthState>,
    pub storage: SharedStorage,
    pub admin: Arc<AdminState>,
    pub filepath_root: PathBuf,
}

/// Build the full application router.
#[must_use]
pub fn router(state: AppState) -> Router {
    let files = Router::new()
        .nest_service("/app", ServeDir::new(&state.filepath_root))
        .layer(middleware::from_fn_with_state(
            state.admin.clone(),
            admin::count_hits,
        ));

    Router::new()
        .route("/api/healthz", get(health::healthz))
        .route("/health", get(health::health))
        .route(
            "/api/users",
            post(users::create_user).put(users::update_user),
        )
        .route("/api/login", post(auth::session::login))
        .route("/api/refresh", post(auth::session::refresh))
        .route("/api/revoke", post(auth::session::revoke))
        .route("/api/validate_chirp", post(chirps::validate_chirp))
        .route(
            "/api/chirps",
            post(chirps::create_chirp).get(chirps::list_chirps),
        )
        .route(
            "/api/chirps/:chirp_id",
            get(chirps::get_chirp).delete(chirps::delete_chirp),
        )
        .route("/admin/metrics", get(admin::metrics))
        .route("/admin/reset", post(admin::reset))
        .merge(files)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(state.auth))
                .layer(Extension(state.storage))
                .layer(Extension(state.admin)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, state: AppState) -> Result<()> {
    info!(
        storage = state.storage.backend(),
        root = %state.filepath_root.display(),
        "Serving files under /app"
    );
    let app = router(state);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Gracefully shutdown");
    }
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
