//! API handlers for chirpy.
//!
//! `auth` holds the session machinery; the other modules are thin endpoints
//! that call into it and the storage traits.

pub mod admin;
pub mod auth;
pub mod chirps;
pub mod health;
pub mod users;
