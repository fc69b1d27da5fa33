//! `Authorization: Bearer <token>` parsing.

use axum::http::{HeaderMap, header::AUTHORIZATION};

use super::AuthError;

const BEARER_PREFIX: &str = "Bearer ";

/// Return the raw token from the `Authorization` header.
///
/// The scheme is matched case-sensitively and exactly one space must separate
/// it from a non-empty token. The token is not validated here.
///
/// # Errors
/// `MissingHeader` when the header is absent, `MalformedHeader` for anything
/// else that does not fit the shape.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers.get(AUTHORIZATION).ok_or(AuthError::MissingHeader)?;
    let value = value.to_str().map_err(|_| AuthError::MalformedHeader)?;
    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::MalformedHeader)?;
    if token.is_empty() || token.starts_with(char::is_whitespace) {
        return Err(AuthError::MalformedHeader);
    }
    Ok(token)
}
