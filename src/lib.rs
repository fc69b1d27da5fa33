//! # Chirpy
//!
//! `chirpy` is a small social-posting API: users register, post short text
//! messages (*chirps*) and manage their sessions.
//!
//! ## Sessions
//!
//! Authentication splits into two token kinds:
//!
//! - **Access tokens** are short-lived HS256 tokens carrying the user id. They
//!   are verified without touching storage and cannot be revoked; their TTL
//!   bounds the exposure of a leaked token.
//! - **Refresh tokens** are opaque 256-bit random strings stored server-side.
//!   They are exchanged for new access tokens at `/api/refresh` and revoked at
//!   `/api/revoke` (logout). Revocation is immediate and one-way.
//!
//! Passwords are stored as Argon2id PHC strings. Login failures never reveal
//! whether the email exists.
//!
//! ## Ownership
//!
//! Mutations on owned resources (deleting a chirp) authenticate the caller
//! first and then compare the subject with the resource's author; a mismatch
//! is `403 Forbidden`.

pub mod api;
pub mod cli;
pub mod storage;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
