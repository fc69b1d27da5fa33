//! Authentication failures and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use super::access_token::TokenError;
use crate::api::error::json_error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password; the two are never distinguished.
    #[error("Incorrect email or password")]
    InvalidCredentials,
    #[error("Missing authorization header")]
    MissingHeader,
    #[error("Malformed authorization header")]
    MalformedHeader,
    #[error("Invalid token")]
    InvalidSignature,
    #[error("Token expired")]
    Expired,
    #[error("Invalid token issuer")]
    WrongIssuer,
    #[error("Unknown refresh token")]
    NotFound,
    #[error("Refresh token revoked")]
    Revoked,
    #[error("Forbidden")]
    Forbidden,
    #[error("storage error: {0:#}")]
    Storage(anyhow::Error),
    #[error("internal error: {0:#}")]
    Internal(anyhow::Error),
}

impl AuthError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials
            | Self::MissingHeader
            | Self::InvalidSignature
            | Self::Expired
            | Self::WrongIssuer
            | Self::NotFound
            | Self::Revoked => StatusCode::UNAUTHORIZED,
            Self::MalformedHeader => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidSignature => Self::InvalidSignature,
            TokenError::Expired => Self::Expired,
            TokenError::WrongIssuer => Self::WrongIssuer,
            TokenError::Encode(err) => Self::Internal(err.into()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Storage(err) => {
                error!("Auth storage failure: {err:#}");
                json_error(status, "Internal server error")
            }
            Self::Internal(err) => {
                error!("Auth internal failure: {err:#}");
                json_error(status, "Internal server error")
            }
            _ => json_error(status, &self.to_string()),
        }
    }
}
