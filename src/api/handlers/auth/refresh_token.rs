//! Opaque refresh tokens.
//!
//! Tokens are 32 bytes from the OS CSPRNG, hex encoded, and stored verbatim
//! with their owner and expiry. A token is usable while it is not revoked and
//! `now < expires_at`; revocation is one-way.

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use rand::{RngCore, rngs::OsRng};
use tracing::warn;
use uuid::Uuid;

use super::AuthError;
use crate::storage::{InsertOutcome, RefreshTokenRecord, RefreshTokenStore};

pub const REFRESH_TOKEN_BYTES: usize = 32;

const INSERT_ATTEMPTS: usize = 3;

/// Generate a fresh refresh token string (64 lowercase hex characters).
///
/// # Errors
/// Returns an error if the OS entropy source fails.
pub fn generate_refresh_token() -> anyhow::Result<String> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate refresh token")?;
    Ok(hex::encode(bytes))
}

/// Decide whether a stored token is usable at `now`.
///
/// Revocation wins over expiry so a logged-out token always reports `Revoked`.
///
/// # Errors
/// `Revoked` or `Expired`.
pub fn classify(record: &RefreshTokenRecord, now: DateTime<Utc>) -> Result<Uuid, AuthError> {
    if record.revoked_at.is_some() {
        return Err(AuthError::Revoked);
    }
    if now >= record.expires_at {
        return Err(AuthError::Expired);
    }
    Ok(record.user_id)
}

/// Create and persist a refresh token for `user_id`.
///
/// # Errors
/// `Internal` if entropy fails or the expiry overflows, `Storage` if the
/// store fails.
pub async fn issue<S>(store: &S, user_id: Uuid, ttl: Duration) -> Result<String, AuthError>
where
    S: RefreshTokenStore + ?Sized,
{
    let expires_at = Utc::now().checked_add_signed(ttl).ok_or_else(|| {
        AuthError::Internal(anyhow::anyhow!("refresh token expiry out of range"))
    })?;
    for _ in 0..INSERT_ATTEMPTS {
        let token = generate_refresh_token().map_err(AuthError::Internal)?;
        match store
            .insert_refresh_token(&token, user_id, expires_at)
            .await
            .map_err(AuthError::Storage)?
        {
            InsertOutcome::Created(_) => return Ok(token),
            InsertOutcome::Conflict => {
                warn!("Refresh token collision, retrying");
            }
        }
    }
    Err(AuthError::Internal(anyhow::anyhow!(
        "failed to store a unique refresh token"
    )))
}

/// Map a presented token to its owner.
///
/// # Errors
/// `NotFound`, `Revoked` or `Expired`, checked in that order; `Storage` if the
/// lookup fails.
pub async fn resolve<S>(store: &S, token: &str) -> Result<Uuid, AuthError>
where
    S: RefreshTokenStore + ?Sized,
{
    let record = store
        .find_refresh_token(token)
        .await
        .map_err(AuthError::Storage)?
        .ok_or(AuthError::NotFound)?;
    classify(&record, Utc::now())
}

/// Revoke a token. Revoking an already revoked token succeeds.
///
/// # Errors
/// `NotFound` for unknown tokens, `Storage` if the update fails.
pub async fn revoke<S>(store: &S, token: &str) -> Result<(), AuthError>
where
    S: RefreshTokenStore + ?Sized,
{
    let found = store
        .revoke_refresh_token(token, Utc::now())
        .await
        .map_err(AuthError::Storage)?;
    if found {
        Ok(())
    } else {
        Err(AuthError::NotFound)
    }
}
