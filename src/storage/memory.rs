//! In-process backend used when no DSN is configured and by the tests.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    ChirpRecord, ChirpStore, InsertOutcome, RefreshTokenRecord, RefreshTokenStore, SortOrder,
    Storage, UpdateOutcome, UserRecord, UserStore,
};

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, UserRecord>,
    // Insertion order doubles as creation order for equal timestamps.
    chirps: Vec<ChirpRecord>,
    refresh_tokens: HashMap<String, RefreshTokenRecord>,
}

/// Store backed by maps behind a single `RwLock`.
///
/// Writes take the lock exclusively, so a revoke that returned is visible to
/// every later resolve.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the expiry of a stored refresh token.
    ///
    /// Lets tests put a token on either side of its expiry boundary.
    pub async fn set_refresh_token_expiry(&self, token: &str, expires_at: DateTime<Utc>) -> bool {
        let mut state = self.state.write().await;
        match state.refresh_tokens.get_mut(token) {
            Some(record) => {
                record.expires_at = expires_at;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> Result<InsertOutcome<UserRecord>> {
        let mut state = self.state.write().await;
        if state.users.values().any(|user| user.email == email) {
            return Ok(InsertOutcome::Conflict);
        }

        let now = Utc::now();
        let user = UserRecord {
            id: Uuid::new_v4(),
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(InsertOutcome::Created(user))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|user| user.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserRecord>> {
        let state = self.state.read().await;
        Ok(state.users.get(&id).cloned())
    }

    async fn update_user(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<UpdateOutcome> {
        let mut state = self.state.write().await;
        if state
            .users
            .values()
            .any(|user| user.email == email && user.id != id)
        {
            return Ok(UpdateOutcome::Conflict);
        }

        let Some(user) = state.users.get_mut(&id) else {
            return Ok(UpdateOutcome::NotFound);
        };
        user.email = email.to_string();
        user.hashed_password = hashed_password.to_string();
        user.updated_at = Utc::now();
        Ok(UpdateOutcome::Updated(user.clone()))
    }

    async fn delete_all_users(&self) -> Result<u64> {
        let mut state = self.state.write().await;
        let deleted = u64::try_from(state.users.len())?;
        state.users.clear();
        state.chirps.clear();
        state.refresh_tokens.clear();
        Ok(deleted)
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryStore {
    async fn insert_refresh_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<InsertOutcome<RefreshTokenRecord>> {
        let mut state = self.state.write().await;
        if state.refresh_tokens.contains_key(token) {
            return Ok(InsertOutcome::Conflict);
        }
        let record = RefreshTokenRecord {
            token: token.to_string(),
            user_id,
            expires_at,
            revoked_at: None,
            created_at: Utc::now(),
        };
        state
            .refresh_tokens
            .insert(token.to_string(), record.clone());
        Ok(InsertOutcome::Created(record))
    }

    async fn find_refresh_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>> {
        let state = self.state.read().await;
        Ok(state.refresh_tokens.get(token).cloned())
    }

    async fn revoke_refresh_token(&self, token: &str, revoked_at: DateTime<Utc>) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.refresh_tokens.get_mut(token) {
            Some(record) => {
                record.revoked_at.get_or_insert(revoked_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ChirpStore for MemoryStore {
    async fn insert_chirp(&self, user_id: Uuid, body: &str) -> Result<ChirpRecord> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user_id) {
            anyhow::bail!("chirp author {user_id} does not exist");
        }
        let now = Utc::now();
        let chirp = ChirpRecord {
            id: Uuid::new_v4(),
            body: body.to_string(),
            user_id,
            created_at: now,
            updated_at: now,
        };
        state.chirps.push(chirp.clone());
        Ok(chirp)
    }

    async fn list_chirps(
        &self,
        author: Option<Uuid>,
        order: SortOrder,
    ) -> Result<Vec<ChirpRecord>> {
        let state = self.state.read().await;
        let mut chirps: Vec<ChirpRecord> = state
            .chirps
            .iter()
            .filter(|chirp| author.is_none_or(|id| chirp.user_id == id))
            .cloned()
            .collect();
        chirps.sort_by_key(|chirp| chirp.created_at);
        if order == SortOrder::Desc {
            chirps.reverse();
        }
        Ok(chirps)
    }

    async fn find_chirp(&self, id: Uuid) -> Result<Option<ChirpRecord>> {
        let state = self.state.read().await;
        Ok(state.chirps.iter().find(|chirp| chirp.id == id).cloned())
    }

    async fn delete_chirp(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.chirps.len();
        state.chirps.retain(|chirp| chirp.id != id);
        Ok(state.chirps.len() != before)
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use chrono::Duration;

    async fn store_with_user(email: &str) -> Result<(MemoryStore, UserRecord)> {
        let store = MemoryStore::new();
        let InsertOutcome::Created(user) = store.insert_user(email, "hash").await? else {
            anyhow::bail!("expected user to be created");
        };
        Ok((store, user))
    }

    #[tokio::test]
    async fn insert_user_rejects_duplicate_email() -> Result<()> {
        let (store, _) = store_with_user("alice@example.com").await?;
        let outcome = store.insert_user("alice@example.com", "other").await?;
        assert!(matches!(outcome, InsertOutcome::Conflict));
        Ok(())
    }

    #[tokio::test]
    async fn update_user_detects_conflict_and_missing() -> Result<()> {
        let (store, alice) = store_with_user("alice@example.com").await?;
        store.insert_user("bob@example.com", "hash").await?;

        let outcome = store
            .update_user(alice.id, "bob@example.com", "new")
            .await?;
        assert!(matches!(outcome, UpdateOutcome::Conflict));

        let outcome = store
            .update_user(Uuid::new_v4(), "carol@example.com", "new")
            .await?;
        assert!(matches!(outcome, UpdateOutcome::NotFound));

        let outcome = store
            .update_user(alice.id, "alice@new.example.com", "new")
            .await?;
        let UpdateOutcome::Updated(updated) = outcome else {
            anyhow::bail!("expected update");
        };
        assert_eq!(updated.email, "alice@new.example.com");
        assert_eq!(updated.created_at, alice.created_at);
        Ok(())
    }

    #[tokio::test]
    async fn revoke_keeps_first_timestamp() -> Result<()> {
        let (store, user) = store_with_user("alice@example.com").await?;
        let expires_at = Utc::now() + Duration::days(1);
        store
            .insert_refresh_token("token", user.id, expires_at)
            .await?;

        let first = Utc::now();
        assert!(store.revoke_refresh_token("token", first).await?);
        assert!(
            store
                .revoke_refresh_token("token", first + Duration::seconds(5))
                .await?
        );
        let record = store
            .find_refresh_token("token")
            .await?
            .context("token should exist")?;
        assert_eq!(record.revoked_at, Some(first));

        assert!(!store.revoke_refresh_token("missing", first).await?);
        Ok(())
    }

    #[tokio::test]
    async fn list_chirps_filters_and_sorts() -> Result<()> {
        let (store, alice) = store_with_user("alice@example.com").await?;
        let InsertOutcome::Created(bob) = store.insert_user("bob@example.com", "hash").await?
        else {
            anyhow::bail!("expected user to be created");
        };
        let first = store.insert_chirp(alice.id, "first").await?;
        store.insert_chirp(bob.id, "second").await?;
        let third = store.insert_chirp(alice.id, "third").await?;

        let all = store.list_chirps(None, SortOrder::Asc).await?;
        assert_eq!(all.len(), 3);

        let alices = store.list_chirps(Some(alice.id), SortOrder::Desc).await?;
        let ids: Vec<Uuid> = alices.iter().map(|chirp| chirp.id).collect();
        assert_eq!(ids, vec![third.id, first.id]);
        Ok(())
    }

    #[tokio::test]
    async fn delete_all_users_cascades() -> Result<()> {
        let (store, user) = store_with_user("alice@example.com").await?;
        store.insert_chirp(user.id, "hello").await?;
        store
            .insert_refresh_token("token", user.id, Utc::now() + Duration::days(1))
            .await?;

        assert_eq!(store.delete_all_users().await?, 1);
        assert!(store.list_chirps(None, SortOrder::Asc).await?.is_empty());
        assert!(store.find_refresh_token("token").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn insert_chirp_requires_existing_author() {
        let store = MemoryStore::new();
        assert!(store.insert_chirp(Uuid::new_v4(), "orphan").await.is_err());
    }
}
