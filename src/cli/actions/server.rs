use crate::{
    api::{
        self, AppState,
        handlers::{
            admin::{AdminState, Platform},
            auth::{AuthConfig, AuthState, WorkFactor},
        },
    },
    storage::{MemoryStore, PgStore, SharedStorage},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{path::PathBuf, sync::Arc};
use tracing::{info, warn};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: Option<String>,
    pub platform: String,
    pub filepath_root: PathBuf,
    pub jwt_secret: SecretString,
    pub jwt_issuer: String,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
    pub work_factor: WorkFactor,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the auth settings are invalid, the database is
/// unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let auth_config = AuthConfig::new()
        .with_jwt_issuer(args.jwt_issuer)
        .with_access_token_ttl_seconds(args.access_token_ttl_seconds)
        .with_refresh_token_ttl_seconds(args.refresh_token_ttl_seconds)
        .with_work_factor(args.work_factor);

    let auth = AuthState::new(auth_config, args.jwt_secret).context("Invalid auth settings")?;

    let storage: SharedStorage = match args.dsn.as_deref() {
        Some(dsn) => Arc::new(PgStore::connect(dsn).await?),
        None => {
            warn!("No DSN configured, data is kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let platform = Platform::parse(&args.platform);
    info!(platform = ?platform, issuer = auth.config().jwt_issuer(), "Starting chirpy");

    let state = AppState {
        auth: Arc::new(auth),
        storage,
        admin: Arc::new(AdminState::new(platform)),
        filepath_root: args.filepath_root,
    };

    api::new(args.port, state).await
}
