//! Durable storage seams for users, chirps and refresh tokens.
//!
//! Handlers and the session coordinator only see the traits below. The
//! Postgres backend is used in production; the in-memory backend serves local
//! runs without `--dsn` and the test suite.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Backend handle shared by every request.
pub type SharedStorage = Arc<dyn Storage>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChirpRecord {
    pub id: Uuid,
    pub body: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persisted refresh token row. The token is stored verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Outcome of an insert guarded by a unique constraint.
#[derive(Debug)]
pub enum InsertOutcome<T> {
    Created(T),
    Conflict,
}

/// Outcome of a profile update.
#[derive(Debug)]
pub enum UpdateOutcome {
    Updated(UserRecord),
    Conflict,
    NotFound,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user; `Conflict` when the email is taken.
    async fn insert_user(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> Result<InsertOutcome<UserRecord>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserRecord>>;

    async fn update_user(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<UpdateOutcome>;

    /// Delete every user; chirps and refresh tokens cascade.
    async fn delete_all_users(&self) -> Result<u64>;
}

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Persist a new refresh token; `Conflict` when the token string exists.
    async fn insert_refresh_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<InsertOutcome<RefreshTokenRecord>>;

    async fn find_refresh_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>>;

    /// Mark the token revoked unless it already is.
    ///
    /// Returns `false` only when the token does not exist. The first
    /// revocation timestamp is kept on repeated calls.
    async fn revoke_refresh_token(&self, token: &str, revoked_at: DateTime<Utc>) -> Result<bool>;
}

#[async_trait]
pub trait ChirpStore: Send + Sync {
    async fn insert_chirp(&self, user_id: Uuid, body: &str) -> Result<ChirpRecord>;

    async fn list_chirps(&self, author: Option<Uuid>, order: SortOrder)
    -> Result<Vec<ChirpRecord>>;

    async fn find_chirp(&self, id: Uuid) -> Result<Option<ChirpRecord>>;

    /// Returns `false` when nothing was deleted.
    async fn delete_chirp(&self, id: Uuid) -> Result<bool>;
}

/// Everything the HTTP layer needs from a backend.
#[async_trait]
pub trait Storage: UserStore + RefreshTokenStore + ChirpStore {
    /// Cheap liveness probe used by `/health`.
    async fn ping(&self) -> Result<()>;

    fn backend(&self) -> &'static str;
}
