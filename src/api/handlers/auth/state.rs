//! Auth state and configuration.

use anyhow::Result;
use chrono::{Duration, Utc};
use secrecy::SecretString;

use super::{access_token::AccessTokenCodec, password::CredentialHasher, password::WorkFactor};

const DEFAULT_JWT_ISSUER: &str = "chirpy";
const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i64 = 60 * 60;
const DEFAULT_REFRESH_TOKEN_TTL_SECONDS: i64 = 60 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    jwt_issuer: String,
    access_token_ttl_seconds: i64,
    refresh_token_ttl_seconds: i64,
    work_factor: WorkFactor,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            jwt_issuer: DEFAULT_JWT_ISSUER.to_string(),
            access_token_ttl_seconds: DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
            refresh_token_ttl_seconds: DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
            work_factor: WorkFactor::default(),
        }
    }

    #[must_use]
    pub fn with_jwt_issuer(mut self, issuer: String) -> Self {
        self.jwt_issuer = issuer;
        self
    }

    #[must_use]
    pub fn with_access_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_work_factor(mut self, work_factor: WorkFactor) -> Self {
        self.work_factor = work_factor;
        self
    }

    #[must_use]
    pub fn jwt_issuer(&self) -> &str {
        &self.jwt_issuer
    }

    #[must_use]
    pub fn access_token_ttl_seconds(&self) -> i64 {
        self.access_token_ttl_seconds
    }

    #[must_use]
    pub fn refresh_token_ttl_seconds(&self) -> i64 {
        self.refresh_token_ttl_seconds
    }

    #[must_use]
    pub fn work_factor(&self) -> WorkFactor {
        self.work_factor
    }

    /// `None` when the seconds do not fit a `Duration`.
    fn refresh_token_ttl(&self) -> Option<Duration> {
        Duration::try_seconds(self.refresh_token_ttl_seconds)
    }
}

/// Shared auth dependencies, built once at startup.
pub struct AuthState {
    config: AuthConfig,
    access_tokens: AccessTokenCodec,
    hasher: CredentialHasher,
    refresh_token_ttl: Duration,
}

impl AuthState {
    /// # Errors
    /// Returns an error if the signing key is empty, a TTL is not positive or
    /// too large to compute an expiry from, or the Argon2 parameters are
    /// rejected.
    pub fn new(config: AuthConfig, signing_key: SecretString) -> Result<Self> {
        if config.refresh_token_ttl_seconds <= 0 {
            anyhow::bail!("refresh token TTL must be positive");
        }
        let Some(refresh_token_ttl) = config.refresh_token_ttl() else {
            anyhow::bail!("refresh token TTL is out of range");
        };
        if Utc::now().checked_add_signed(refresh_token_ttl).is_none() {
            anyhow::bail!("refresh token TTL is out of range");
        }
        let access_tokens = AccessTokenCodec::new(
            signing_key,
            config.jwt_issuer.clone(),
            config.access_token_ttl_seconds,
        )?;
        let hasher = CredentialHasher::new(config.work_factor)?;
        Ok(Self {
            config,
            access_tokens,
            hasher,
            refresh_token_ttl,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn access_tokens(&self) -> &AccessTokenCodec {
        &self.access_tokens
    }

    #[must_use]
    pub fn hasher(&self) -> &CredentialHasher {
        &self.hasher
    }

    pub(super) fn refresh_token_ttl(&self) -> Duration {
        self.refresh_token_ttl
    }
}
