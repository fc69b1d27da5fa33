//! Authenticated principal extraction.
//!
//! Flow Overview: read the bearer access token, verify it, and return a
//! principal that downstream handlers can use for ownership checks.

use axum::http::HeaderMap;
use uuid::Uuid;

use super::{AuthError, AuthState, session::authenticate};

/// Authenticated user context derived from the access token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
}

/// Resolve the bearer access token into a principal.
///
/// # Errors
/// Any header or token failure from [`authenticate`].
pub fn require_auth(headers: &HeaderMap, auth_state: &AuthState) -> Result<Principal, AuthError> {
    authenticate(auth_state, headers).map(|user_id| Principal { user_id })
}
