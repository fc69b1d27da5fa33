//! Auth handlers and supporting modules.
//!
//! This module covers password credentials, access tokens, refresh tokens and
//! the session endpoints built on them.
//!
//! ## Tokens
//!
//! - Access tokens are HS256 JWTs signed with the process key. They are
//!   checked on every protected request and expire after the configured TTL.
//! - Refresh tokens are 64 hex characters stored in the `refresh_tokens`
//!   table. They expire after the refresh TTL and can be revoked at
//!   `/api/revoke`.
//!
//! > **Warning:** Changing the signing key invalidates every access token in
//! > flight. Refresh tokens survive and can mint new ones.

pub mod access_token;
mod bearer;
mod error;
pub mod password;
pub(crate) mod principal;
pub mod refresh_token;
pub(crate) mod session;
mod state;
pub(crate) mod types;
pub(crate) mod utils;

pub use bearer::extract_bearer_token;
pub use error::AuthError;
pub use password::{CredentialHasher, WorkFactor};
pub use session::{
    LoginSession, authenticate, authorize_owner, login_user, refresh_access_token,
    revoke_session,
};
pub use state::{AuthConfig, AuthState};
