//! Postgres backend checks.
//!
//! Runs against `CHIRPY_TEST_DSN` and is skipped when it is unset. The schema
//! in `sql/schema.sql` is applied first; every test uses fresh emails so runs
//! can share a database.

use anyhow::{Context, Result};
use chirpy::{
    api::handlers::auth::{
        AuthConfig, AuthError, AuthState, WorkFactor, login_user, refresh_access_token,
        revoke_session,
    },
    storage::{
        ChirpStore, InsertOutcome, PgStore, RefreshTokenStore, SortOrder, UpdateOutcome, UserStore,
    },
};
use chrono::{Duration, Utc};
use secrecy::SecretString;
use uuid::Uuid;

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

async fn store() -> Result<Option<PgStore>> {
    let Ok(dsn) = std::env::var("CHIRPY_TEST_DSN") else {
        eprintln!("CHIRPY_TEST_DSN not set, skipping");
        return Ok(None);
    };
    let store = PgStore::connect(&dsn).await?;
    apply_schema(&store, SCHEMA_SQL).await?;
    Ok(Some(store))
}

async fn apply_schema(store: &PgStore, sql: &str) -> Result<()> {
    for (index, statement) in split_sql_statements(sql).iter().enumerate() {
        sqlx::query(statement)
            .execute(store.pool())
            .await
            .with_context(|| format!("Failed to execute schema statement {}", index + 1))?;
    }
    Ok(())
}

fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}

fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@chirpy.dev", Uuid::new_v4().simple())
}

fn auth_state() -> Result<AuthState> {
    let config = AuthConfig::new().with_work_factor(WorkFactor {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    });
    AuthState::new(config, SecretString::from("pg-test-key".to_string()))
}

#[test]
fn split_sql_statements_skips_comments() {
    let statements = split_sql_statements("-- header\nCREATE TABLE a (\n id INT\n);\nSELECT 1;\n");
    assert_eq!(statements, vec!["CREATE TABLE a (\n id INT\n);", "SELECT 1;"]);
}

#[tokio::test]
async fn users_are_unique_by_email() -> Result<()> {
    let Some(store) = store().await? else {
        return Ok(());
    };
    let email = unique_email("dup");

    let first = store.insert_user(&email, "hash").await?;
    let InsertOutcome::Created(user) = first else {
        anyhow::bail!("first insert should create the user");
    };
    assert!(matches!(
        store.insert_user(&email, "hash").await?,
        InsertOutcome::Conflict
    ));

    let other = unique_email("other");
    assert!(matches!(
        store.insert_user(&other, "hash").await?,
        InsertOutcome::Created(_)
    ));
    assert!(matches!(
        store.update_user(user.id, &other, "hash2").await?,
        UpdateOutcome::Conflict
    ));
    assert!(matches!(
        store.update_user(Uuid::new_v4(), &unique_email("ghost"), "hash").await?,
        UpdateOutcome::NotFound
    ));
    Ok(())
}

#[tokio::test]
async fn session_lifecycle() -> Result<()> {
    let Some(store) = store().await? else {
        return Ok(());
    };
    let auth = auth_state()?;
    let email = unique_email("session");
    let hash = auth.hasher().hash("hunter2")?;
    store.insert_user(&email, &hash).await?;

    let session = login_user(&auth, &store, &email, "hunter2").await?;
    let subject = auth.access_tokens().verify(&session.access_token)?;
    assert_eq!(subject, session.user.id);

    let refreshed = refresh_access_token(&auth, &store, &session.refresh_token).await?;
    assert_eq!(auth.access_tokens().verify(&refreshed)?, subject);

    revoke_session(&store, &session.refresh_token).await?;
    revoke_session(&store, &session.refresh_token).await?;
    assert!(matches!(
        refresh_access_token(&auth, &store, &session.refresh_token).await,
        Err(AuthError::Revoked)
    ));
    assert!(matches!(
        revoke_session(&store, "0000").await,
        Err(AuthError::NotFound)
    ));
    Ok(())
}

#[tokio::test]
async fn refresh_token_rows() -> Result<()> {
    let Some(store) = store().await? else {
        return Ok(());
    };
    let InsertOutcome::Created(user) = store.insert_user(&unique_email("rt"), "hash").await?
    else {
        anyhow::bail!("user insert failed");
    };
    let token = Uuid::new_v4().simple().to_string();
    let expires_at = Utc::now() + Duration::hours(1);

    assert!(matches!(
        store.insert_refresh_token(&token, user.id, expires_at).await?,
        InsertOutcome::Created(_)
    ));
    assert!(matches!(
        store.insert_refresh_token(&token, user.id, expires_at).await?,
        InsertOutcome::Conflict
    ));

    let first_revoke = Utc::now();
    assert!(store.revoke_refresh_token(&token, first_revoke).await?);
    assert!(
        store
            .revoke_refresh_token(&token, first_revoke + Duration::minutes(5))
            .await?
    );
    let record = store
        .find_refresh_token(&token)
        .await?
        .context("token row missing")?;
    let revoked_at = record.revoked_at.context("token should be revoked")?;
    // Postgres keeps microseconds; the first timestamp wins.
    assert!((revoked_at - first_revoke).num_milliseconds().abs() < 1);

    assert!(!store.revoke_refresh_token("missing", Utc::now()).await?);
    Ok(())
}

#[tokio::test]
async fn chirps_follow_their_author() -> Result<()> {
    let Some(store) = store().await? else {
        return Ok(());
    };
    let InsertOutcome::Created(user) = store.insert_user(&unique_email("chirper"), "hash").await?
    else {
        anyhow::bail!("user insert failed");
    };

    let first = store.insert_chirp(user.id, "first").await?;
    let second = store.insert_chirp(user.id, "second").await?;

    let asc = store.list_chirps(Some(user.id), SortOrder::Asc).await?;
    let ids: Vec<Uuid> = asc.iter().map(|chirp| chirp.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);

    let desc = store.list_chirps(Some(user.id), SortOrder::Desc).await?;
    assert_eq!(desc.first().map(|chirp| chirp.id), Some(second.id));

    assert!(store.delete_chirp(first.id).await?);
    assert!(!store.delete_chirp(first.id).await?);
    assert_eq!(store.find_chirp(first.id).await?, None);
    Ok(())
}
